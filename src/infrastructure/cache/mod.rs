pub mod in_memory;
pub mod redis_cache;

pub use in_memory::InMemorySnapshotCache;
pub use redis_cache::RedisSnapshotCache;
