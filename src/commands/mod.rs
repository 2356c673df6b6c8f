pub mod edit;
pub mod extract;
pub mod matching;
pub mod mine;
pub mod normalize;
pub mod status;
pub mod validate;
