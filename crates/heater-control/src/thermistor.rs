//! Thermistor models for converting ADC values to temperature.

use num_traits::Float;

/// A trait for thermistor models.
pub trait Thermistor<Adc, Temp> {
    /// Converts an ADC reading to a temperature value.
    fn adc_to_temperature(&self, adc_value: Adc) -> Temp;
}

/// An NTC thermistor model using the Steinhart-Hart equation:
/// `T = 1 / (a + b*ln(R) + c*(ln(R))^3)`.
#[derive(Debug, Clone, Copy)]
pub struct SteinhartHart<F: Float> {
    /// Resistance of the pull-up/pull-down resistor in the voltage divider.
    pub series_resistance: F,
    /// The maximum ADC value (e.g. 4095 for a 12-bit ADC).
    pub adc_max: F,
    pub a: F,
    pub b: F,
    pub c: F,
}

impl<F: Float> SteinhartHart<F> {
    pub fn new(series_resistance: F, adc_max: F, a: F, b: F, c: F) -> Self {
        Self { series_resistance, adc_max, a, b, c }
    }

    /// Resistance implied by a raw ADC reading.
    pub fn adc_to_resistance(&self, adc_value: F) -> F {
        if adc_value >= self.adc_max {
            return F::zero();
        }
        self.series_resistance * (self.adc_max / adc_value - F::one())
    }
}

impl<F: Float> Thermistor<F, F> for SteinhartHart<F> {
    /// Converts an ADC reading to temperature in Kelvin.
    fn adc_to_temperature(&self, adc_value: F) -> F {
        if adc_value <= F::zero() {
            return F::zero();
        }
        let resistance = self.adc_to_resistance(adc_value);
        if resistance <= F::zero() {
            return F::infinity();
        }

        let ln_r = resistance.ln();
        let temp_inv = self.a + self.b * ln_r + self.c * ln_r.powi(3);

        if temp_inv <= F::zero() {
            F::infinity()
        } else {
            F::one() / temp_inv
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntc_100k_b3950_matches_known_temperature_points() {
        // Coefficients for a common NTC 100k B3950 thermistor with a 4.7k pull-up.
        let sh = SteinhartHart {
            series_resistance: 4700.0,
            adc_max: 4095.0,
            a: 0.00078864,
            b: 0.00020845,
            c: 0.00000012506,
        };

        let temp_c_25 = sh.adc_to_temperature(183.83) - 273.15;
        assert!((temp_c_25 - 25.0).abs() < 0.1, "temp @ 25C was {:.2}", temp_c_25);

        let temp_c_200 = sh.adc_to_temperature(270.9) - 273.15;
        assert!((temp_c_200 - 200.0).abs() < 0.1, "temp @ 200C was {:.2}", temp_c_200);
    }
}
