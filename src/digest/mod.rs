pub mod audit;
pub mod broker;
pub mod config;
pub mod credentials;
pub mod export;
pub mod extract;
pub mod host;
pub mod openai;
pub mod page;
pub mod paths;
pub mod protocol;
pub mod runtime;
pub mod storage;
pub mod summaries;
pub mod surface;
pub mod util;
