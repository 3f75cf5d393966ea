pub(crate) mod snapshots;
pub(crate) mod verify;

pub(crate) use snapshots::*;
pub(crate) use verify::*;
