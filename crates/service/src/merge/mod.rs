//! JSON merge for the patch flow.

pub mod merge_patch;
