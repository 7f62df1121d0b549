//! Damageable hit-point counter with a one-shot death transition.

/// Outcome of a damage or heal call that changed a living `Health`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthChange {
    pub previous: f32,
    pub current: f32,
    /// True only on the call that first brought health to zero.
    pub died: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    max_health: f32,
    current_health: f32,
    death_raised: bool,
}

impl Health {
    /// Full health. Non-positive maxima are raised to the smallest positive value.
    pub fn new(max_health: f32) -> Self {
        let max_health = sanitize_max(max_health);
        Self {
            max_health,
            current_health: max_health,
            death_raised: false,
        }
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn current_health(&self) -> f32 {
        self.current_health
    }

    pub fn is_dead(&self) -> bool {
        self.death_raised || self.current_health <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        self.current_health / self.max_health
    }

    /// Subtract `amount` (negative treated as 0), clamping at zero.
    ///
    /// Returns `None` once the owner is dead. The returned change has
    /// `died` set exactly once, after the value has been clamped to 0.
    pub fn take_damage(&mut self, amount: f32) -> Option<HealthChange> {
        if self.is_dead() {
            return None;
        }
        let previous = self.current_health;
        self.current_health = (previous - amount.max(0.0)).max(0.0);
        let died = self.current_health <= 0.0;
        if died {
            self.death_raised = true;
        }
        Some(HealthChange {
            previous,
            current: self.current_health,
            died,
        })
    }

    /// No-op while dead.
    pub fn heal(&mut self, amount: f32) -> Option<HealthChange> {
        if self.is_dead() {
            return None;
        }
        let previous = self.current_health;
        self.current_health = (previous + amount.max(0.0)).min(self.max_health);
        Some(HealthChange {
            previous,
            current: self.current_health,
            died: false,
        })
    }

    /// Replace the maximum and clamp current health into the new range.
    pub fn set_max_health(&mut self, new_max: f32) -> HealthChange {
        let previous = self.current_health;
        self.max_health = sanitize_max(new_max);
        self.current_health = self.current_health.min(self.max_health);
        HealthChange {
            previous,
            current: self.current_health,
            died: false,
        }
    }
}

fn sanitize_max(max_health: f32) -> f32 {
    if max_health.is_finite() && max_health > 0.0 {
        max_health
    } else {
        f32::MIN_POSITIVE
    }
}
