//! Collaborators the core consults but does not own.
//!
//! Behavior programs, command input, animation data and the tie-break RNG are
//! all read-only from the core's point of view. The [`Env`] aggregate bundles
//! them so the engine can reach everything without hard coupling to concrete
//! implementations.
mod animation;
mod commands;
mod error;
mod program;
mod rng;

pub use animation::{AnimFrame, AnimationDef, AnimationOracle, FrameDef, StaticAnimations};
pub use commands::{CommandSource, NoInput, ScriptedInput};
pub use error::OracleError;
pub use program::{BehaviorProgram, IdleProgram};
pub use rng::{PcgRng, RngOracle, compute_seed};

/// Aggregates the collaborators required by one tick.
pub struct Env<'a, P, C, A, R>
where
    P: BehaviorProgram + ?Sized,
    C: CommandSource + ?Sized,
    A: AnimationOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    program: &'a P,
    commands: &'a C,
    animations: &'a A,
    rng: &'a R,
}

pub type FightEnv<'a> = Env<
    'a,
    dyn BehaviorProgram + 'a,
    dyn CommandSource + 'a,
    dyn AnimationOracle + 'a,
    dyn RngOracle + 'a,
>;

impl<'a, P, C, A, R> Env<'a, P, C, A, R>
where
    P: BehaviorProgram + ?Sized,
    C: CommandSource + ?Sized,
    A: AnimationOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(program: &'a P, commands: &'a C, animations: &'a A, rng: &'a R) -> Self {
        Self {
            program,
            commands,
            animations,
            rng,
        }
    }

    pub fn program(&self) -> &'a P {
        self.program
    }

    pub fn commands(&self) -> &'a C {
        self.commands
    }

    pub fn animations(&self) -> &'a A {
        self.animations
    }

    pub fn rng(&self) -> &'a R {
        self.rng
    }
}

impl<P, C, A, R> Clone for Env<'_, P, C, A, R>
where
    P: BehaviorProgram + ?Sized,
    C: CommandSource + ?Sized,
    A: AnimationOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C, A, R> Copy for Env<'_, P, C, A, R>
where
    P: BehaviorProgram + ?Sized,
    C: CommandSource + ?Sized,
    A: AnimationOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

impl<'a> FightEnv<'a> {
    /// Type-erases concrete collaborators.
    pub fn with_all<P, C, A, R>(program: &'a P, commands: &'a C, animations: &'a A, rng: &'a R) -> Self
    where
        P: BehaviorProgram + 'a,
        C: CommandSource + 'a,
        A: AnimationOracle + 'a,
        R: RngOracle + 'a,
    {
        Env::new(
            program as &dyn BehaviorProgram,
            commands as &dyn CommandSource,
            animations as &dyn AnimationOracle,
            rng as &dyn RngOracle,
        )
    }
}
