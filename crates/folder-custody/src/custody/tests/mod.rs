mod alerts;
mod common;
mod dismissal;
mod registry;
