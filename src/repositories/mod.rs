pub mod memory;
pub mod post;

pub use memory::InMemoryPostStore;
pub use post::{PgPostRepository, PostStore, UpdateResult};

#[cfg(test)]
pub use post::MockPostStore;
