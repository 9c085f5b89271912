//! Relationship builders
//!
//! Each builder reads exactly one aspect kind and maps it to relationship
//! updates. Builders are plain functions generic over the aspect union, so the
//! same builder is registered for every entity type whose union carries the
//! aspect it reads. They never deduplicate: duplicate owners or datasets in the
//! aspect become duplicate edges, and de-duplication is left to the sink.

use crate::aspect::{AspectKind, AspectRef, DataJobInputOutput, Ownership};
use crate::error::{DerivationError, DerivationResult};
use crate::relation::{RelationshipType, RelationshipUpdate};
use crate::urn::{Urn, CORP_USER_TYPE, DATASET_TYPE};

pub const PRODUCES_FROM_INPUT_OUTPUT: &str = "ProducesBuilderFromDataJobInputOutput";
pub const CONSUMES_FROM_INPUT_OUTPUT: &str = "ConsumesBuilderFromDataJobInputOutput";
pub const DOWNSTREAM_OF_FROM_INPUT_OUTPUT: &str = "DownstreamOfBuilderFromDataJobInputOutput";
pub const OWNED_BY_FROM_OWNERSHIP: &str = "OwnedByBuilderFromOwnership";

/// Edge property holding the ownership type on `OwnedBy` edges
pub const OWNERSHIP_TYPE_PROPERTY: &str = "type";

fn expect_aspect<'a, A, T>(
    urn: &Urn,
    aspect: &'a A,
    kind: AspectKind,
    builder: &'static str,
) -> DerivationResult<&'a T>
where
    A: AspectRef<T>,
{
    aspect.aspect_ref().ok_or_else(|| {
        DerivationError::new(urn, kind.name(), builder, "builder invoked with a different aspect")
    })
}

fn require_datasets(urn: &Urn, builder: &'static str, datasets: &[Urn]) -> DerivationResult<()> {
    match datasets.iter().find(|d| !d.is_type(DATASET_TYPE)) {
        Some(other) => Err(DerivationError::new(
            urn,
            AspectKind::DataJobInputOutput.name(),
            builder,
            format!("expected a dataset urn, found '{}'", other),
        )),
        None => Ok(()),
    }
}

/// `urn -Produces-> output` for every output dataset
pub fn produces_from_input_output<A>(
    urn: &Urn,
    aspect: &A,
) -> DerivationResult<Vec<RelationshipUpdate>>
where
    A: AspectRef<DataJobInputOutput>,
{
    let io: &DataJobInputOutput =
        expect_aspect(urn, aspect, AspectKind::DataJobInputOutput, PRODUCES_FROM_INPUT_OUTPUT)?;
    require_datasets(urn, PRODUCES_FROM_INPUT_OUTPUT, &io.output_datasets)?;

    let pairs = io
        .output_datasets
        .iter()
        .map(|output| (urn.clone(), output.clone()));
    Ok(vec![RelationshipUpdate::replace_from_source(
        urn.clone(),
        RelationshipType::Produces,
        pairs,
    )])
}

/// `urn -Consumes-> input` for every input dataset
pub fn consumes_from_input_output<A>(
    urn: &Urn,
    aspect: &A,
) -> DerivationResult<Vec<RelationshipUpdate>>
where
    A: AspectRef<DataJobInputOutput>,
{
    let io: &DataJobInputOutput =
        expect_aspect(urn, aspect, AspectKind::DataJobInputOutput, CONSUMES_FROM_INPUT_OUTPUT)?;
    require_datasets(urn, CONSUMES_FROM_INPUT_OUTPUT, &io.input_datasets)?;

    let pairs = io
        .input_datasets
        .iter()
        .map(|input| (urn.clone(), input.clone()));
    Ok(vec![RelationshipUpdate::replace_from_source(
        urn.clone(),
        RelationshipType::Consumes,
        pairs,
    )])
}

/// `output -DownstreamOf-> input` for every (input, output) pair
///
/// Empty inputs or outputs give an empty (still emitted) update.
pub fn downstream_of_from_input_output<A>(
    urn: &Urn,
    aspect: &A,
) -> DerivationResult<Vec<RelationshipUpdate>>
where
    A: AspectRef<DataJobInputOutput>,
{
    let io: &DataJobInputOutput = expect_aspect(
        urn,
        aspect,
        AspectKind::DataJobInputOutput,
        DOWNSTREAM_OF_FROM_INPUT_OUTPUT,
    )?;
    require_datasets(urn, DOWNSTREAM_OF_FROM_INPUT_OUTPUT, &io.input_datasets)?;
    require_datasets(urn, DOWNSTREAM_OF_FROM_INPUT_OUTPUT, &io.output_datasets)?;

    let pairs = io.input_datasets.iter().flat_map(|upstream| {
        io.output_datasets
            .iter()
            .map(move |downstream| (downstream.clone(), upstream.clone()))
    });
    Ok(vec![RelationshipUpdate::replace_from_source(
        urn.clone(),
        RelationshipType::DownstreamOf,
        pairs,
    )])
}

/// `urn -OwnedBy-> user` for every owner that is a user
///
/// Owners of any other type (groups) are not users and get no edge.
pub fn owned_by_from_ownership<A>(
    urn: &Urn,
    aspect: &A,
) -> DerivationResult<Vec<RelationshipUpdate>>
where
    A: AspectRef<Ownership>,
{
    let ownership: &Ownership =
        expect_aspect(urn, aspect, AspectKind::Ownership, OWNED_BY_FROM_OWNERSHIP)?;

    let mut update =
        RelationshipUpdate::replace_from_source(urn.clone(), RelationshipType::OwnedBy, []);
    for owner in ownership
        .owners
        .iter()
        .filter(|o| o.owner.is_type(CORP_USER_TYPE))
    {
        update.push(urn.clone(), owner.owner.clone()).properties.insert(
            OWNERSHIP_TYPE_PROPERTY.to_string(),
            owner.owner_type.as_str().to_string(),
        );
    }
    Ok(vec![update])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{Owner, OwnershipType, Status};
    use crate::relation::RemovalOption;
    use crate::snapshot::DataJobAspect;

    fn job() -> Urn {
        "urn:li:dataJob:(urn:li:dataFlow:(airflow,etl_flow,PROD),load_users)"
            .parse()
            .unwrap()
    }

    fn dataset(name: &str) -> Urn {
        Urn::dataset("hive", name, "PROD").unwrap()
    }

    fn io(inputs: &[&str], outputs: &[&str]) -> DataJobAspect {
        DataJobAspect::InputOutput(DataJobInputOutput::new(
            inputs.iter().map(|n| dataset(n)).collect(),
            outputs.iter().map(|n| dataset(n)).collect(),
        ))
    }

    #[test]
    fn test_produces_and_consumes() {
        let aspect = io(&["raw_users"], &["clean_users"]);

        let produces = produces_from_input_output(&job(), &aspect).unwrap();
        assert_eq!(produces.len(), 1);
        let edges = produces[0].edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, job());
        assert_eq!(edges[0].destination, dataset("clean_users"));
        assert_eq!(produces[0].removal_option, RemovalOption::RemoveAllEdgesFromSource);

        let consumes = consumes_from_input_output(&job(), &aspect).unwrap();
        let edges = consumes[0].edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, job());
        assert_eq!(edges[0].destination, dataset("raw_users"));
        assert_eq!(edges[0].relationship_type, RelationshipType::Consumes);
    }

    #[test]
    fn test_downstream_of_is_cross_product() {
        let aspect = io(&["a", "b"], &["x", "y", "z"]);
        let updates = downstream_of_from_input_output(&job(), &aspect).unwrap();
        let edges = updates[0].edges();
        assert_eq!(edges.len(), 6);
        assert_eq!(edges[0].source, dataset("x"));
        assert_eq!(edges[0].destination, dataset("a"));
        assert_eq!(edges[5].source, dataset("z"));
        assert_eq!(edges[5].destination, dataset("b"));
    }

    #[test]
    fn test_downstream_of_with_no_outputs_is_empty_but_emitted() {
        let aspect = io(&["a", "b"], &[]);
        let updates = downstream_of_from_input_output(&job(), &aspect).unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_empty());
        assert_eq!(updates[0].removal_option, RemovalOption::RemoveAllEdgesFromSource);
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let aspect = io(&["a", "a"], &[]);
        let updates = consumes_from_input_output(&job(), &aspect).unwrap();
        assert_eq!(updates[0].len(), 2);
    }

    #[test]
    fn test_non_dataset_input_is_a_derivation_error() {
        let aspect = DataJobAspect::InputOutput(DataJobInputOutput::new(
            vec![Urn::corp_user("alice").unwrap()],
            vec![],
        ));
        let err = consumes_from_input_output(&job(), &aspect).unwrap_err();
        assert_eq!(err.builder, CONSUMES_FROM_INPUT_OUTPUT);
        assert_eq!(err.aspect, "dataJobInputOutput");
        assert_eq!(err.urn, job().to_string());
    }

    #[test]
    fn test_owned_by() {
        let aspect = DataJobAspect::Ownership(Ownership::new(vec![
            Owner::new(Urn::corp_user("alice").unwrap(), OwnershipType::Developer),
            Owner::new(Urn::corp_user("bob").unwrap(), OwnershipType::DataOwner),
        ]));
        let updates = owned_by_from_ownership(&job(), &aspect).unwrap();
        let edges = updates[0].edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].destination, Urn::corp_user("alice").unwrap());
        assert_eq!(edges[1].destination, Urn::corp_user("bob").unwrap());
        assert!(edges.iter().all(|e| e.source == job()));
        assert_eq!(edges[1].properties[OWNERSHIP_TYPE_PROPERTY], "DATAOWNER");
        assert_eq!(updates[0].removal_option, RemovalOption::RemoveAllEdgesFromSource);
    }

    #[test]
    fn test_owned_by_skips_groups() {
        let group = Urn::new("corpGroup", vec!["data-eng".into()]).unwrap();
        let aspect = DataJobAspect::Ownership(Ownership::new(vec![Owner::new(
            group,
            OwnershipType::Developer,
        )]));
        let updates = owned_by_from_ownership(&job(), &aspect).unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].is_empty());
    }

    #[test]
    fn test_wrong_aspect_is_reported_not_panicked() {
        let aspect = DataJobAspect::Status(Status { removed: true });
        let err = produces_from_input_output(&job(), &aspect).unwrap_err();
        assert_eq!(err.builder, PRODUCES_FROM_INPUT_OUTPUT);
    }
}
