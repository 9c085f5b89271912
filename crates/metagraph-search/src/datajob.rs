//! Data job search documents

use crate::document::{DataJobDocument, DocumentPatch};
use crate::index::{expect_aspect, user_owners, DocumentBuilder, IndexBuilder};
use metagraph_core::aspect::{AspectKind, DataJobInfo, Ownership, Status};
use metagraph_core::error::DerivationResult;
use metagraph_core::urn::DATA_JOB_TYPE;
use metagraph_core::{DataJobAspect, DataJobUrn, Urn, ValidationError};

const INFO_DOCUMENT: &str = "DataJobDocumentFromDataJobInfo";
const OWNERSHIP_DOCUMENT: &str = "DataJobDocumentFromOwnership";
const STATUS_DOCUMENT: &str = "DataJobDocumentFromStatus";

/// `/<flowId>/<jobId>`, lower-cased
pub fn browse_path(urn: &DataJobUrn) -> String {
    format!("/{}/{}", urn.flow.flow_id, urn.job_id).to_lowercase()
}

fn base_document(urn: &Urn) -> Result<DocumentPatch, ValidationError> {
    let job = DataJobUrn::try_from(urn)?;
    Ok(DataJobDocument {
        data_flow: Some(job.flow.flow_id.clone()),
        job_id: Some(job.job_id.clone()),
        browse_paths: Some(vec![browse_path(&job)]),
        ..DataJobDocument::new(urn.clone())
    }
    .into())
}

fn info_document(urn: &Urn, aspect: &DataJobAspect) -> DerivationResult<DocumentPatch> {
    let info: &DataJobInfo = expect_aspect(urn, aspect, AspectKind::DataJobInfo, INFO_DOCUMENT)?;
    Ok(DataJobDocument {
        name: Some(info.name.clone()),
        description: info.description.clone(),
        job_type: info.job_type.clone(),
        ..DataJobDocument::new(urn.clone())
    }
    .into())
}

fn ownership_document(urn: &Urn, aspect: &DataJobAspect) -> DerivationResult<DocumentPatch> {
    let ownership: &Ownership =
        expect_aspect(urn, aspect, AspectKind::Ownership, OWNERSHIP_DOCUMENT)?;
    Ok(DataJobDocument {
        owners: Some(user_owners(ownership)),
        ..DataJobDocument::new(urn.clone())
    }
    .into())
}

fn status_document(urn: &Urn, aspect: &DataJobAspect) -> DerivationResult<DocumentPatch> {
    let status: &Status = expect_aspect(urn, aspect, AspectKind::Status, STATUS_DOCUMENT)?;
    Ok(DataJobDocument {
        removed: Some(status.removed),
        ..DataJobDocument::new(urn.clone())
    }
    .into())
}

pub static DATA_JOB_DOCUMENT_BUILDERS: &[DocumentBuilder<DataJobAspect>] = &[
    DocumentBuilder::new(INFO_DOCUMENT, AspectKind::DataJobInfo, info_document),
    DocumentBuilder::new(OWNERSHIP_DOCUMENT, AspectKind::Ownership, ownership_document),
    DocumentBuilder::new(STATUS_DOCUMENT, AspectKind::Status, status_document),
];

pub static DATA_JOB_INDEX_BUILDER: IndexBuilder<DataJobAspect> =
    IndexBuilder::new(DATA_JOB_TYPE, base_document, DATA_JOB_DOCUMENT_BUILDERS);
