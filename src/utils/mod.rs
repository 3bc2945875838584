pub mod rowfields;
