pub mod file;
pub mod postgres;

pub use file::FileRepository;
pub use postgres::PostgresRepository;
