//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 负责应用生命周期：根据配置组装存储与各个服务，挂载路由和中间件，
//! 监听端口并在收到 Ctrl-C 后优雅退出。
//!
//! ## 层次关系
//!
//! ```text
//! server::App (持有配置与共享状态)
//!     ↓
//! routes (HTTP 处理函数)
//!     ↓
//! services (能力层：catalog / cache / performance / reasoner)
//!     ↓
//! infrastructure (基础设施：RowStore / RestClient)
//! ```

pub mod server;

pub use server::App;
