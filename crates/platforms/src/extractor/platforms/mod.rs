pub mod ceskatelevize;
