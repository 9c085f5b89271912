//! Data flow search documents

use crate::document::{DataFlowDocument, DocumentPatch};
use crate::index::{expect_aspect, user_owners, DocumentBuilder, IndexBuilder};
use metagraph_core::aspect::{AspectKind, DataFlowInfo, Ownership, Status};
use metagraph_core::error::DerivationResult;
use metagraph_core::urn::DATA_FLOW_TYPE;
use metagraph_core::{DataFlowAspect, DataFlowUrn, Urn, ValidationError};

const INFO_DOCUMENT: &str = "DataFlowDocumentFromDataFlowInfo";
const OWNERSHIP_DOCUMENT: &str = "DataFlowDocumentFromOwnership";
const STATUS_DOCUMENT: &str = "DataFlowDocumentFromStatus";

/// `/<orchestrator>/<cluster>/<flowId>`, lower-cased
pub fn browse_path(urn: &DataFlowUrn) -> String {
    format!("/{}/{}/{}", urn.orchestrator, urn.cluster, urn.flow_id).to_lowercase()
}

fn base_document(urn: &Urn) -> Result<DocumentPatch, ValidationError> {
    let flow = DataFlowUrn::try_from(urn)?;
    Ok(DataFlowDocument {
        orchestrator: Some(flow.orchestrator.clone()),
        flow_id: Some(flow.flow_id.clone()),
        cluster: Some(flow.cluster.clone()),
        browse_paths: Some(vec![browse_path(&flow)]),
        ..DataFlowDocument::new(urn.clone())
    }
    .into())
}

fn info_document(urn: &Urn, aspect: &DataFlowAspect) -> DerivationResult<DocumentPatch> {
    let info: &DataFlowInfo = expect_aspect(urn, aspect, AspectKind::DataFlowInfo, INFO_DOCUMENT)?;
    Ok(DataFlowDocument {
        name: Some(info.name.clone()),
        description: info.description.clone(),
        project: info.project.clone(),
        ..DataFlowDocument::new(urn.clone())
    }
    .into())
}

fn ownership_document(urn: &Urn, aspect: &DataFlowAspect) -> DerivationResult<DocumentPatch> {
    let ownership: &Ownership =
        expect_aspect(urn, aspect, AspectKind::Ownership, OWNERSHIP_DOCUMENT)?;
    Ok(DataFlowDocument {
        owners: Some(user_owners(ownership)),
        ..DataFlowDocument::new(urn.clone())
    }
    .into())
}

fn status_document(urn: &Urn, aspect: &DataFlowAspect) -> DerivationResult<DocumentPatch> {
    let status: &Status = expect_aspect(urn, aspect, AspectKind::Status, STATUS_DOCUMENT)?;
    Ok(DataFlowDocument {
        removed: Some(status.removed),
        ..DataFlowDocument::new(urn.clone())
    }
    .into())
}

pub static DATA_FLOW_DOCUMENT_BUILDERS: &[DocumentBuilder<DataFlowAspect>] = &[
    DocumentBuilder::new(INFO_DOCUMENT, AspectKind::DataFlowInfo, info_document),
    DocumentBuilder::new(OWNERSHIP_DOCUMENT, AspectKind::Ownership, ownership_document),
    DocumentBuilder::new(STATUS_DOCUMENT, AspectKind::Status, status_document),
];

pub static DATA_FLOW_INDEX_BUILDER: IndexBuilder<DataFlowAspect> =
    IndexBuilder::new(DATA_FLOW_TYPE, base_document, DATA_FLOW_DOCUMENT_BUILDERS);
