//! Ego-to-object closing-rate state carried across a run.

/// Closing velocity / acceleration estimate for the constant-acceleration model.
///
/// Progresses strictly forward:
/// `Uninitialized → VelocityKnown → VelocityAndAccelerationKnown`.
/// Only a new run resets it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum KinematicState {
    #[default]
    Uninitialized,
    /// Closing velocity (m/s) from the first frame pair.
    VelocityKnown { velocity: f64 },
    /// Acceleration (m/s²) is frozen after its first estimate; only the
    /// velocity is propagated.
    VelocityAndAccelerationKnown { velocity: f64, acceleration: f64 },
}

impl KinematicState {
    pub fn velocity(&self) -> Option<f64> {
        match *self {
            Self::Uninitialized => None,
            Self::VelocityKnown { velocity }
            | Self::VelocityAndAccelerationKnown { velocity, .. } => Some(velocity),
        }
    }

    pub fn acceleration(&self) -> Option<f64> {
        match *self {
            Self::VelocityAndAccelerationKnown { acceleration, .. } => Some(acceleration),
            _ => None,
        }
    }

    /// Feed one closing-velocity sample measured over `dt` seconds.
    ///
    /// - Uninitialized: the sample becomes the velocity.
    /// - VelocityKnown: acceleration is estimated from the two samples and the
    ///   sample becomes the current velocity.
    /// - Fully known: no effect (acceleration is not re-estimated).
    pub fn observe_velocity(&mut self, sample: f64, dt: f64) {
        *self = match *self {
            Self::Uninitialized => Self::VelocityKnown { velocity: sample },
            Self::VelocityKnown { velocity } => Self::VelocityAndAccelerationKnown {
                velocity: sample,
                acceleration: (sample - velocity) / dt,
            },
            known @ Self::VelocityAndAccelerationKnown { .. } => known,
        };
    }

    /// Propagate velocity by one interval: `v ← v + a·dt`.
    ///
    /// No effect until acceleration is known.
    pub fn advance(&mut self, dt: f64) {
        if let Self::VelocityAndAccelerationKnown {
            velocity,
            acceleration,
        } = self
        {
            *velocity += *acceleration * dt;
        }
    }
}
