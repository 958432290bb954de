use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("could not find organism '{0}' in the NCBI taxonomy")]
    #[diagnostic(
        code(harvest::unknown_organism),
        help(
            "check the scientific name in the NCBI Taxonomy browser, or look the organism up in ENA (https://www.ebi.ac.uk/ena) instead"
        )
    )]
    UnknownOrganism(String),

    #[error("NCBI stores no genes for '{0}'")]
    #[diagnostic(
        code(harvest::no_genes),
        help("check the spelling of the organism name")
    )]
    NoGenesFound(String),

    #[error("invalid taxonomy id: {0}")]
    InvalidTaxonomyId(String),

    #[error("no contact given; pass it as the second argument or set `contact` in the config file")]
    #[diagnostic(code(harvest::missing_contact))]
    MissingContact,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("E-utilities request failed: {0}")]
    EutilsHttp(String),

    #[error("E-utilities returned status {status}: {message}")]
    EutilsStatus { status: u16, message: String },

    #[error("malformed E-utilities response: {0}")]
    MalformedResponse(String),

    #[error("output error: {0}")]
    Output(String),
}
