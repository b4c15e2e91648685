pub mod backend;
pub mod qdrant;
pub mod search;
pub mod vectorizer;

pub use backend::{SparseSearchBackend, SparseSearchRequest, UnavailableBackend};
pub use qdrant::QdrantService;
pub use search::search_tfidf;
pub use vectorizer::{TfidfVectorizer, Vectorizer};
