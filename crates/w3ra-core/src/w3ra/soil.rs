//! Three-layer soil moisture engine.
//!
//! Each layer is a nonlinear bucket whose outflow grows with the square of
//! its relative saturation. The end-of-step storage is the positive root of
//! `A S'^2 + S' - (S + I - U) = 0` with `A = Km / Smax^2`, except where the
//! layer runs dry (depletion) or overflows (saturation). After the branch
//! is chosen the storage is clamped to `[0, Smax]` and any residual is put
//! back into the outflows so the layer balance closes exactly.

/// Geometry and conductivity of one soil layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    /// Capacity [mm].
    pub capacity: f64,
    /// Saturated conductivity of this layer [mm/d].
    pub k_sat: f64,
    /// Saturated conductivity of the layer below [mm/d].
    pub k_below: f64,
    /// Terrain slope and the coefficients of the interflow partition.
    pub slope: f64,
    pub slope_coeff: f64,
    pub kr_coeff: f64,
    /// Whether the layer sheds lateral interflow.
    pub lateral: bool,
}

impl Layer {
    /// A layer with lateral interflow above a layer of conductivity `k_below`.
    pub fn lateral(
        capacity: f64,
        k_sat: f64,
        k_below: f64,
        slope: f64,
        slope_coeff: f64,
        kr_coeff: f64,
    ) -> Self {
        Self {
            capacity,
            k_sat,
            k_below,
            slope,
            slope_coeff,
            kr_coeff,
            lateral: true,
        }
    }

    /// The bottom layer: drains to groundwater only, no interflow partition.
    pub fn deep(capacity: f64, k_sat: f64) -> Self {
        Self {
            capacity,
            k_sat,
            k_below: k_sat,
            slope: 0.0,
            slope_coeff: 0.0,
            kr_coeff: 0.0,
            lateral: false,
        }
    }

    /// Interflow share `Rh` of the drainage, at relative saturation `w`.
    pub fn interflow_fraction(&self, w: f64) -> f64 {
        if !self.lateral {
            return 0.0;
        }
        let topographic = (self.slope_coeff * self.slope * w).tanh();
        let conductivity = (self.kr_coeff * (self.k_sat / self.k_below - 1.0) * w).tanh();
        (topographic * conductivity).clamp(0.0, 1.0)
    }

    /// Conductivity scaling the outflow of the general case.
    pub fn mean_conductivity(&self) -> f64 {
        if self.lateral {
            (self.k_sat * self.k_below).sqrt()
        } else {
            self.k_sat
        }
    }
}

/// Which branch of the layer balance applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOutcome {
    /// Extraction met or exceeded the water available; the layer empties.
    Depleted,
    /// Storage from the quadratic solve.
    General,
    /// Net inflow exceeded what the layer can hold and drain; storage at capacity.
    Saturated,
}

/// End-of-step balance of one layer [mm/d; storage in mm].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBalance {
    pub outcome: LayerOutcome,
    pub storage: f64,
    /// Extraction actually taken (capped at the available water on depletion).
    pub extraction: f64,
    pub drainage: f64,
    pub interflow: f64,
}

impl LayerBalance {
    /// `storage - (start + inflow - extraction - drainage - interflow)`.
    pub fn residual(&self, start: f64, inflow: f64) -> f64 {
        self.storage - (start + inflow - self.extraction - self.drainage - self.interflow)
    }
}

/// Positive root of `a s^2 + s - x = 0`.
///
/// Written as `2x / (1 + sqrt(1 + 4ax))`, which stays accurate for small
/// `a x` and finite at `a = 0`.
#[inline]
pub fn quadratic_storage(a: f64, x: f64) -> f64 {
    2.0 * x / (1.0 + (1.0 + 4.0 * a * x).sqrt())
}

/// Advance one layer through a timestep.
///
/// `storage` is the prior storage, `inflow` the water entering from above
/// and `extraction` the evaporative or root uptake demand. Depletion is
/// checked first, then saturation; the general case applies otherwise.
pub fn solve_layer(layer: &Layer, storage: f64, inflow: f64, extraction: f64) -> LayerBalance {
    let smax = layer.capacity;
    let w = storage / smax;
    let rh = layer.interflow_fraction(w);
    let available = storage + inflow;

    let (outcome, new_storage, extraction, drainage, interflow) = if available <= extraction {
        (LayerOutcome::Depleted, 0.0, available, 0.0, 0.0)
    } else if smax - storage + layer.k_sat <= inflow - extraction {
        let excess = storage + inflow - extraction - smax - layer.k_sat;
        (
            LayerOutcome::Saturated,
            smax,
            extraction,
            (1.0 - rh) * layer.k_sat,
            rh * layer.k_sat + excess,
        )
    } else {
        let km = layer.mean_conductivity();
        let s = quadratic_storage(km / (smax * smax), available - extraction);
        let outflow = km * (s / smax).powi(2);
        (
            LayerOutcome::General,
            s,
            extraction,
            (1.0 - rh) * outflow,
            rh * outflow,
        )
    };

    close_balance(
        LayerBalance {
            outcome,
            storage: new_storage.clamp(0.0, smax),
            extraction,
            drainage,
            interflow,
        },
        storage,
        inflow,
        rh,
    )
}

/// Clamp-and-close: push the balance residual into the outflows, split by `rh`.
pub fn close_balance(mut balance: LayerBalance, start: f64, inflow: f64, rh: f64) -> LayerBalance {
    let residual = start + inflow
        - balance.extraction
        - balance.drainage
        - balance.interflow
        - balance.storage;
    balance.drainage += (1.0 - rh) * residual;
    balance.interflow += rh * residual;
    balance
}

/// Soil column balance for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBalance {
    pub top: LayerBalance,
    pub shallow: LayerBalance,
    pub deep: LayerBalance,
}

impl ColumnBalance {
    /// Interflow of all layers, deep saturation excess included.
    pub fn total_interflow(&self) -> f64 {
        self.top.interflow + self.shallow.interflow + self.deep.interflow
    }

    /// Recharge to groundwater.
    pub fn recharge(&self) -> f64 {
        self.deep.drainage
    }
}

/// Cascade infiltration through the top, shallow and deep layers.
///
/// Each layer's drainage is the next layer's inflow. `stores` and
/// `extractions` are ordered top, shallow, deep.
pub fn solve_column(
    layers: &[Layer; 3],
    stores: [f64; 3],
    infiltration: f64,
    extractions: [f64; 3],
) -> ColumnBalance {
    let top = solve_layer(&layers[0], stores[0], infiltration, extractions[0]);
    let shallow = solve_layer(&layers[1], stores[1], top.drainage, extractions[1]);
    let deep = solve_layer(&layers[2], stores[2], shallow.drainage, extractions[2]);
    ColumnBalance { top, shallow, deep }
}
