pub mod currency;
pub mod location;
pub mod partner;
pub mod rate;

#[cfg(test)]
pub(crate) mod test_utils;
