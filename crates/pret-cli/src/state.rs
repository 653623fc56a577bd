//! # State Subcommands
//!
//! Read and reset the aggregate state. Resets are guarded: without an
//! explicit `--expected` the command uses the value it just read, so a
//! concurrent change between read and write still surfaces as a conflict.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use pret_state::Totals;

use crate::{print_json, Context};

/// Arguments for `pret state`.
#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Subcommand, Debug)]
pub enum StateCommand {
    /// Print the current state.
    Show,

    /// Clear the compliance flag.
    ResetCompliance {
        /// Flag value the caller observed.
        #[arg(long)]
        expected: Option<bool>,
    },

    /// Zero the counters and timestamp.
    ResetCounters {
        /// Observed `total_verifications`.
        #[arg(long)]
        expected_verifications: Option<u64>,
        /// Observed `total_entities`.
        #[arg(long)]
        expected_entities: Option<u64>,
        /// Observed `last_verification_time`.
        #[arg(long)]
        expected_time: Option<u64>,
    },
}

/// Execute `pret state`.
pub fn run_state(args: &StateArgs, ctx: &Context) -> Result<u8> {
    let machine = ctx.state_machine()?;
    let state = match &args.command {
        StateCommand::Show => machine.current()?,
        StateCommand::ResetCompliance { expected } => {
            let expected = match expected {
                Some(flag) => *flag,
                None => machine.current()?.compliant,
            };
            machine.reset_compliance(expected)?
        }
        StateCommand::ResetCounters {
            expected_verifications,
            expected_entities,
            expected_time,
        } => {
            let expected = match (expected_verifications, expected_entities, expected_time) {
                (Some(v), Some(e), Some(t)) => Totals {
                    total_verifications: *v,
                    total_entities: *e,
                    last_verification_time: *t,
                },
                (None, None, None) => machine.current()?.totals(),
                _ => bail!("give all three --expected-* values or none"),
            };
            machine.reset_counters(&expected)?
        }
    };
    print_json(&state)?;
    Ok(0)
}
