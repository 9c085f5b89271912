//! Index builder - dispatches a snapshot's aspects to document builders

use crate::dataflow::DATA_FLOW_INDEX_BUILDER;
use crate::datajob::DATA_JOB_INDEX_BUILDER;
use crate::document::DocumentPatch;
use metagraph_core::aspect::{AspectKind, AspectRef, AspectUnion, Ownership};
use metagraph_core::error::DerivationResult;
use metagraph_core::urn::CORP_USER_TYPE;
use metagraph_core::{
    DataFlowAspect, DataJobAspect, DerivationError, EntitySnapshot, Result, Snapshot, Urn,
    ValidationError,
};

/// Builds the urn-derived base patch
pub type BaseDocumentFn = fn(&Urn) -> std::result::Result<DocumentPatch, ValidationError>;

/// Builds the patch contributed by one aspect
pub type DocumentFn<A> = fn(&Urn, &A) -> DerivationResult<DocumentPatch>;

/// One registry entry: the aspect kind a document builder accepts
#[derive(Debug)]
pub struct DocumentBuilder<A> {
    pub name: &'static str,
    pub aspect: AspectKind,
    pub build: DocumentFn<A>,
}

impl<A> DocumentBuilder<A> {
    pub const fn new(name: &'static str, aspect: AspectKind, build: DocumentFn<A>) -> Self {
        Self {
            name,
            aspect,
            build,
        }
    }
}

/// Borrow the aspect a document builder was registered for
pub(crate) fn expect_aspect<'a, A, T>(
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

/// Usernames of the owners that are users, in aspect order
pub(crate) fn user_owners(ownership: &Ownership) -> Vec<String> {
    ownership
        .owners
        .iter()
        .filter(|o| o.owner.is_type(CORP_USER_TYPE))
        .filter_map(|o| o.owner.text(0).map(str::to_string))
        .collect()
}

/// Per-entity-type index builder
///
/// Emits the urn-derived base patch first, then one patch per present aspect
/// that has a registered document builder, in snapshot order.
#[derive(Debug)]
pub struct IndexBuilder<A: 'static> {
    entity_type: &'static str,
    base_document: BaseDocumentFn,
    document_builders: &'static [DocumentBuilder<A>],
}

impl<A: AspectUnion + 'static> IndexBuilder<A> {
    pub const fn new(
        entity_type: &'static str,
        base_document: BaseDocumentFn,
        document_builders: &'static [DocumentBuilder<A>],
    ) -> Self {
        Self {
            entity_type,
            base_document,
            document_builders,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn document_builders(&self) -> &'static [DocumentBuilder<A>] {
        self.document_builders
    }

    /// Derive the document patches for a snapshot
    pub fn process(&self, snapshot: &Snapshot<A>) -> Result<Vec<DocumentPatch>> {
        snapshot.validate(self.entity_type)?;

        let mut patches = vec![(self.base_document)(&snapshot.urn)?];
        for aspect in &snapshot.aspects {
            let Some(kind) = aspect.kind() else {
                tracing::trace!(
                    urn = %snapshot.urn,
                    aspect = aspect.name(),
                    "Skipping unrecognised aspect"
                );
                continue;
            };

            for builder in self.document_builders.iter().filter(|b| b.aspect == kind) {
                let patch = (builder.build)(&snapshot.urn, aspect).map_err(|e| {
                    tracing::warn!(
                        urn = %snapshot.urn,
                        aspect = %kind,
                        builder = builder.name,
                        "Document builder failed: {}",
                        e.message
                    );
                    e
                })?;
                patches.push(patch);
            }
        }

        tracing::debug!(
            urn = %snapshot.urn,
            patches = patches.len(),
            "Built document patches"
        );
        Ok(patches)
    }
}

/// Index builders for every supported entity type
#[derive(Debug, Clone, Copy)]
pub struct IndexRegistry {
    data_job: &'static IndexBuilder<DataJobAspect>,
    data_flow: &'static IndexBuilder<DataFlowAspect>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self {
            data_job: &DATA_JOB_INDEX_BUILDER,
            data_flow: &DATA_FLOW_INDEX_BUILDER,
        }
    }

    /// Route a snapshot to the index builder for its entity type
    pub fn process(&self, snapshot: &EntitySnapshot) -> Result<Vec<DocumentPatch>> {
        match snapshot {
            EntitySnapshot::DataJob(s) => self.data_job.process(s),
            EntitySnapshot::DataFlow(s) => self.data_flow.process(s),
        }
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}
