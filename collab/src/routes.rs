mod documents;
mod shares;

pub use documents::{create_document, delete_document, list_documents};
pub use shares::{list_shared_documents, remove_share, share_document};
