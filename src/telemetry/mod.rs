pub(crate) mod recovery;

pub(crate) use recovery::RecoveryTelemetry;
