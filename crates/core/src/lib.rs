#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

mod fnc;

pub mod cnf;
pub mod dbs;
pub mod err;
pub mod key;
pub mod kvs;
pub mod ql;
pub mod rpc;
