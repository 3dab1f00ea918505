//! Effects for mechanical outputs: servos and smoke units.

use super::{Animate, OutputTargets};
use crate::traits::OutputBank;

// ============================================================================
// Servo
// ============================================================================

/// Servo moving between two endpoints.
///
/// The servo rests at `endpoint_a`. Every transition from inactive to active
/// flips the target endpoint (A → B → A …); deactivating does not move it.
/// The current angle is written to every output on each update.
///
/// # Travel speed
///
/// `travel_speed` 1-255 maps linearly onto 0.01-0.5 degrees per millisecond;
/// 0 moves instantly.
///
/// ```
/// use dcc_aux::effects::{Animate, Servo};
///
/// let mut servo = Servo::new(0, 180, 47);
/// assert!((servo.speed_deg_per_ms().unwrap() - 0.1).abs() < 0.001);
///
/// servo.set_active(true);
/// assert_eq!(servo.target_angle(), 180.0);
/// ```
#[derive(Clone, Debug)]
pub struct Servo {
    endpoint_a: u8,
    endpoint_b: u8,
    speed: Option<f32>,
    current: f32,
    target: f32,
    at_a: bool,
    active: bool,
}

impl Servo {
    /// Create a servo resting at `endpoint_a`.
    pub fn new(endpoint_a: u8, endpoint_b: u8, travel_speed: u8) -> Self {
        let speed = (travel_speed > 0).then(|| 0.01 + (travel_speed as f32 / 255.0) * 0.49);
        Self {
            endpoint_a,
            endpoint_b,
            speed,
            current: endpoint_a as f32,
            target: endpoint_a as f32,
            at_a: true,
            active: false,
        }
    }

    /// Travel speed, or `None` for instantaneous moves.
    pub fn speed_deg_per_ms(&self) -> Option<f32> {
        self.speed
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> f32 {
        self.current
    }

    /// Angle the servo is moving towards.
    pub fn target_angle(&self) -> f32 {
        self.target
    }
}

impl Animate for Servo {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if self.current != self.target {
            self.current = match self.speed {
                Some(speed) => {
                    let step = speed * elapsed_ms as f32;
                    if self.current < self.target {
                        (self.current + step).min(self.target)
                    } else {
                        (self.current - step).max(self.target)
                    }
                }
                None => self.target,
            };
        }
        outputs.fill_angle(self.current as u16)
    }

    fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.target = if self.at_a {
                self.endpoint_b
            } else {
                self.endpoint_a
            } as f32;
            self.at_a = !self.at_a;
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// SmokeGenerator
// ============================================================================

/// Smoke unit with a heater (first output) and a fan (second output).
///
/// With a single output only the heater is driven.
#[derive(Clone, Debug)]
pub struct SmokeGenerator {
    heater_enabled: bool,
    fan_speed: u8,
    active: bool,
}

impl SmokeGenerator {
    /// Create a smoke unit.
    pub fn new(heater_enabled: bool, fan_speed: u8) -> Self {
        Self {
            heater_enabled,
            fan_speed,
            active: false,
        }
    }
}

impl Animate for SmokeGenerator {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        _elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        let heater = if self.active && self.heater_enabled {
            u8::MAX
        } else {
            0
        };
        let fan = if self.active { self.fan_speed } else { 0 };
        outputs.set_value(0, heater)?;
        outputs.set_value(1, fan)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockOutput;
    use crate::traits::{OutputId, OutputKind};
    use alloc::vec;
    use alloc::vec::Vec;

    fn servo_bank() -> Vec<MockOutput> {
        vec![MockOutput::servo_at(0)]
    }

    fn step(servo: &mut Servo, bank: &mut Vec<MockOutput>, ms: u32) -> u16 {
        servo
            .update(ms, &mut OutputTargets::new(&[OutputId(1)], bank))
            .unwrap();
        bank[0].angle
    }

    // === Servo ===
    #[test]
    fn servo_ping_pongs_between_endpoints() {
        let mut bank = servo_bank();
        let mut servo = Servo::new(0, 180, 47);

        servo.set_active(true);
        let a = step(&mut servo, &mut bank, 900);
        assert!((89..=91).contains(&a), "angle {}", a);
        assert_eq!(step(&mut servo, &mut bank, 1000), 180);
        assert_eq!(step(&mut servo, &mut bank, 1000), 180);

        servo.set_active(false);
        assert_eq!(step(&mut servo, &mut bank, 500), 180);

        servo.set_active(true);
        let back = step(&mut servo, &mut bank, 900);
        assert!((89..=91).contains(&back), "angle {}", back);
        assert_eq!(step(&mut servo, &mut bank, 5000), 0);
    }

    #[test]
    fn servo_repeated_activation_does_not_flip() {
        let mut servo = Servo::new(10, 20, 100);
        servo.set_active(true);
        servo.set_active(true);
        assert_eq!(servo.target_angle(), 20.0);
    }

    #[test]
    fn servo_zero_speed_is_instant() {
        let mut bank = servo_bank();
        let mut servo = Servo::new(30, 150, 0);
        assert!(servo.speed_deg_per_ms().is_none());
        assert_eq!(step(&mut servo, &mut bank, 0), 30);
        servo.set_active(true);
        assert_eq!(step(&mut servo, &mut bank, 1), 150);
    }

    #[test]
    fn servo_never_leaves_endpoint_range() {
        let mut bank = servo_bank();
        let mut servo = Servo::new(20, 160, 255);
        for cycle in 0..6 {
            servo.set_active(cycle % 2 == 0);
            for ms in [7, 13, 400, 1, 90] {
                let angle = step(&mut servo, &mut bank, ms);
                assert!((20..=160).contains(&angle));
            }
        }
    }

    #[test]
    fn servo_speed_range() {
        let slow = Servo::new(0, 1, 1).speed_deg_per_ms().unwrap();
        let fast = Servo::new(0, 1, 255).speed_deg_per_ms().unwrap();
        assert!(slow > 0.01 && slow < 0.0125);
        assert!((fast - 0.5).abs() < 0.0001);
    }

    // === SmokeGenerator ===
    #[test]
    fn smoke_drives_heater_and_fan() {
        let mut bank = vec![MockOutput::new(OutputKind::Intensity); 2];
        let ids = [OutputId(1), OutputId(2)];
        let mut smoke = SmokeGenerator::new(true, 90);

        smoke
            .update(10, &mut OutputTargets::new(&ids, &mut bank))
            .unwrap();
        assert_eq!((bank[0].value, bank[1].value), (0, 0));

        smoke.set_active(true);
        smoke
            .update(10, &mut OutputTargets::new(&ids, &mut bank))
            .unwrap();
        assert_eq!((bank[0].value, bank[1].value), (255, 90));
    }

    #[test]
    fn smoke_without_heater_runs_fan_only() {
        let mut bank = vec![MockOutput::new(OutputKind::Intensity); 2];
        let ids = [OutputId(1), OutputId(2)];
        let mut smoke = SmokeGenerator::new(false, 40);
        smoke.set_active(true);
        smoke
            .update(10, &mut OutputTargets::new(&ids, &mut bank))
            .unwrap();
        assert_eq!((bank[0].value, bank[1].value), (0, 40));
    }

    #[test]
    fn smoke_with_one_output_is_partial() {
        let mut bank = vec![MockOutput::new(OutputKind::Intensity); 2];
        let ids = [OutputId(2)];
        let mut smoke = SmokeGenerator::new(true, 40);
        smoke.set_active(true);
        smoke
            .update(10, &mut OutputTargets::new(&ids, &mut bank))
            .unwrap();
        assert_eq!(bank[1].value, 255);
        assert_eq!(bank[0].write_count, 0);
    }
}
