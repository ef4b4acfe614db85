pub mod cli;

pub use cli::{
    BottlenecksArgs, Cli, Commands, CompareArgs, InputArgs, OutputFormat, ReferenceArgs,
    SolveArgs,
};
