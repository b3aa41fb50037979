pub mod efa;
