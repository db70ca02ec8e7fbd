pub(crate) mod into_iter;
pub(crate) mod vec;
