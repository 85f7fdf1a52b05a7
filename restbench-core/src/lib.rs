mod http;
mod token;

pub mod runner;

pub use http::{
    Error as HttpError, HttpClient, HttpRequest, HttpResponse, Result as HttpResult, Transport,
};
pub use token::{INDEX_TOKEN, substitute_headers, substitute_str, substitute_value};
pub use restbench_value::Value;
