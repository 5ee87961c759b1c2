use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} does not exist in this tree")]
    NodeNotFound(usize),
    #[error("the {1} child of node {0} is already set")]
    SlotOccupied(usize, &'static str),
    #[error("the tree already has a root")]
    RootAlreadySet,
    #[error("traversal exceeded the step limit of {0}, the tree is probably not well formed")]
    StepLimitExceeded(usize),
}
