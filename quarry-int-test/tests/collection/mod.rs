mod find_test;
mod index_test;
mod snapshot_test;
mod update_test;
