use crate::types::ResampleMethod;

/// Pick the interpolation for bringing a raster of `input_pixel_size` onto
/// `output_pixel_size`: nearest when they are equal, area averaging when the
/// output pixels are coarser, cubic when they are finer.
pub fn choose_method(output_pixel_size: f64, input_pixel_size: f64) -> ResampleMethod {
    if output_pixel_size == input_pixel_size {
        ResampleMethod::Nearest
    } else if output_pixel_size > input_pixel_size {
        ResampleMethod::Average
    } else {
        ResampleMethod::Cubic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BandId;

    #[test]
    fn partition_is_total() {
        let sizes = [10.0, 20.0, 60.0, 15.5];
        for &out in &sizes {
            for &inp in &sizes {
                let expected = if out == inp {
                    ResampleMethod::Nearest
                } else if out > inp {
                    ResampleMethod::Average
                } else {
                    ResampleMethod::Cubic
                };
                assert_eq!(choose_method(out, inp), expected, "out={out} in={inp}");
            }
        }
    }

    #[test]
    fn twenty_metre_output_over_native_resolutions() {
        let methods: Vec<(BandId, ResampleMethod)> = BandId::ALL
            .iter()
            .map(|b| (*b, choose_method(20.0, b.nominal_resolution())))
            .collect();
        for (band, method) in methods {
            let expected = match band.nominal_resolution() {
                r if r == 10.0 => ResampleMethod::Average,
                r if r == 20.0 => ResampleMethod::Nearest,
                _ => ResampleMethod::Cubic,
            };
            assert_eq!(method, expected, "{band}");
        }
    }
}
