mod orchestrator;
mod resolver;
mod traits;

pub(crate) use orchestrator::*;
pub(crate) use resolver::*;
pub(crate) use traits::*;
