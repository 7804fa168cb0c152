mod transfer_configuration;

pub use self::transfer_configuration::TransferConfiguration;
