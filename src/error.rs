use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, from the point of view of someone at the command line.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the library")]
    Open,
    /// An argument parsed by clap but was rejected by the codec.
    #[display("invalid {_0}")]
    Argument(#[error(not(source))] &'static str),
    #[display("operation failed")]
    Library,
}
