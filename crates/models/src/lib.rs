pub mod errors;
pub mod db;
pub mod coach;
pub mod client;

#[cfg(test)]
mod tests;
