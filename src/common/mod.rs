pub mod response;
pub mod status;

pub use response::{Envelope, GenericResponse, Reply, ReplyBody};
