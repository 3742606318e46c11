//! 基础设施层
//!
//! 持有稀缺资源（HTTP 连接池），向上只暴露 `RowStore` 能力

pub mod memory_store;
pub mod rest_client;
pub mod row_query;
pub mod store;

pub use memory_store::MemoryStore;
pub use rest_client::{RestClient, RestResponse};
pub use row_query::{Filter, Order, RowQuery};
pub use store::{RowStore, SupabaseStore};
