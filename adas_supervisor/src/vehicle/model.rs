//! Kinematic bicycle model.
//!
//! Maps between steering angle and path curvature, with live-updated tire
//! stiffness and steer ratio. Understeer is captured by the slip factor;
//! above the characteristic speed the curvature gain drops with u².

use adas_common::car::CarParams;

/// Bicycle-model parameters plus the live-updated stiffness/ratio pair.
#[derive(Debug, Clone)]
pub struct VehicleModel {
    /// Mass [kg].
    m: f64,
    /// Wheelbase [m].
    l: f64,
    /// CG to front axle [m].
    a_f: f64,
    /// CG to rear axle [m].
    a_r: f64,
    /// Nominal front cornering stiffness [N/rad].
    c_f_nominal: f64,
    /// Nominal rear cornering stiffness [N/rad].
    c_r_nominal: f64,
    /// Live front cornering stiffness [N/rad].
    c_f: f64,
    /// Live rear cornering stiffness [N/rad].
    c_r: f64,
    /// Live steer ratio.
    s_r: f64,
}

impl VehicleModel {
    pub fn new(cp: &CarParams) -> Self {
        Self {
            m: cp.mass,
            l: cp.wheelbase,
            a_f: cp.center_to_front,
            a_r: cp.wheelbase - cp.center_to_front,
            c_f_nominal: cp.tire_stiffness_front,
            c_r_nominal: cp.tire_stiffness_rear,
            c_f: cp.tire_stiffness_front,
            c_r: cp.tire_stiffness_rear,
            s_r: cp.steer_ratio,
        }
    }

    /// Refresh the live estimates (called once per tick).
    pub fn update_params(&mut self, stiffness_factor: f64, steer_ratio: f64) {
        self.c_f = stiffness_factor * self.c_f_nominal;
        self.c_r = stiffness_factor * self.c_r_nominal;
        self.s_r = steer_ratio;
    }

    /// Live steer ratio.
    #[inline]
    pub fn steer_ratio(&self) -> f64 {
        self.s_r
    }

    /// Slip factor κ_s = m·(c_f·a_f − c_r·a_r) / (l²·c_f·c_r).
    fn slip_factor(&self) -> f64 {
        self.m * (self.c_f * self.a_f - self.c_r * self.a_r)
            / (self.l * self.l * self.c_f * self.c_r)
    }

    /// Curvature per radian of road-wheel angle at speed `u` [1/m/rad].
    pub fn curvature_factor(&self, u: f64) -> f64 {
        let sf = self.slip_factor();
        1.0 / (1.0 - sf * u * u) / self.l
    }

    /// Path curvature [1/m] for a steering-wheel angle [rad] at speed `u`.
    pub fn calc_curvature(&self, steer_angle_rad: f64, u: f64) -> f64 {
        self.curvature_factor(u) * steer_angle_rad / self.s_r
    }

    /// Steering-wheel angle [rad] that yields `curvature` at speed `u`.
    pub fn steer_from_curvature(&self, curvature: f64, u: f64) -> f64 {
        curvature * self.s_r / self.curvature_factor(u)
    }
}
