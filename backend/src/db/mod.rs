pub mod history_repository;
