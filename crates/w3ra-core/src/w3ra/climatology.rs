//! Monthly climatology of vegetation and albedo terms.
//!
//! Canopy conductance and albedo inputs vary by calendar month. Each unit
//! holds twelve `SeasonalTerms`; the step picks the month containing the
//! forcing's day of year.
use super::constants::SEASONAL_PARAMS;

/// Month-dependent vegetation and albedo terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalTerms {
    /// Vegetation photosynthetic capacity index [-].
    pub vc: f64,
    /// Maximum stomatal conductance coefficient [m/s].
    pub cgsmax: f64,
    /// Vegetation albedo per unit vc [-].
    pub f_alb_vc: f64,
    /// Dry bare-soil albedo [-].
    pub alb_dry: f64,
    /// Wet bare-soil albedo [-].
    pub alb_wet: f64,
    /// Snow albedo [-].
    pub alb_snow: f64,
}

impl Default for SeasonalTerms {
    fn default() -> Self {
        let d = |i: usize| SEASONAL_PARAMS[i].default.unwrap_or(0.0);
        Self {
            vc: d(0),
            cgsmax: d(1),
            f_alb_vc: d(2),
            alb_dry: d(3),
            alb_wet: d(4),
            alb_snow: d(5),
        }
    }
}

impl SeasonalTerms {
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.vc,
            self.cgsmax,
            self.f_alb_vc,
            self.alb_dry,
            self.alb_wet,
            self.alb_snow,
        ]
    }

    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            vc: arr[0],
            cgsmax: arr[1],
            f_alb_vc: arr[2],
            alb_dry: arr[3],
            alb_wet: arr[4],
            alb_snow: arr[5],
        }
    }
}

/// First day of year of each month (non-leap calendar), 1-based.
const MONTH_START: [u32; 12] = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Calendar month index (0-11) of a 1-based day of year.
///
/// Day 366 falls in December; out-of-range days clamp to the year ends.
pub fn month_of_day(day_of_year: u32) -> usize {
    let doy = day_of_year.clamp(1, 366);
    MONTH_START.partition_point(|&start| start <= doy) - 1
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyClimatology {
    pub months: [SeasonalTerms; 12],
}

impl Default for MonthlyClimatology {
    fn default() -> Self {
        Self::constant(SeasonalTerms::default())
    }
}

impl MonthlyClimatology {
    /// The same terms in every month.
    pub fn constant(terms: SeasonalTerms) -> Self {
        Self { months: [terms; 12] }
    }

    pub fn for_month(&self, month: usize) -> &SeasonalTerms {
        &self.months[month.min(11)]
    }

    pub fn for_day_of_year(&self, day_of_year: u32) -> &SeasonalTerms {
        self.for_month(month_of_day(day_of_year))
    }
}
