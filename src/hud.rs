/// One-way notifications from the simulation to whatever shows score and health
pub trait HudListener {
    fn score_changed(&mut self, score: u32);
    fn health_changed(&mut self, hp: f32, max_hp: f32);
    fn game_over(&mut self, final_score: u32);
}

/// What the overlay draws. Only ever written through [`HudListener`].
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub score: u32,
    pub hp: f32,
    pub max_hp: f32,
    pub final_score: Option<u32>,
    pub visible: bool,
}

impl Hud {
    pub fn new(max_hp: f32) -> Self {
        Hud {
            score: 0,
            hp: max_hp,
            max_hp,
            final_score: None,
            visible: true,
        }
    }

    /// Health as a fraction in [0, 1] for the bar
    pub fn health_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl HudListener for Hud {
    fn score_changed(&mut self, score: u32) {
        log::info!("Score: {}", score);
        self.score = score;
    }

    fn health_changed(&mut self, hp: f32, max_hp: f32) {
        self.hp = hp;
        self.max_hp = max_hp;
    }

    fn game_over(&mut self, final_score: u32) {
        log::info!("Game over! Final score: {}", final_score);
        self.final_score = Some(final_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_hud_records_notifications() {
        let mut hud = Hud::new(100.0);
        assert_approx_eq!(hud.health_fraction(), 1.0);
        hud.score_changed(100);
        hud.health_changed(-20.0, 100.0);
        assert_eq!(hud.score, 100);
        assert_approx_eq!(hud.health_fraction(), 0.0);
        assert!(hud.final_score.is_none());
        hud.game_over(100);
        assert_eq!(hud.final_score, Some(100));
    }
}
