pub mod analyst;
