pub(crate) mod chat;
pub(crate) mod ingest;
pub(crate) mod status;
