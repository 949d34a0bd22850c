/// One environmental measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }

    pub fn fields(&self) -> [(&'static str, f64); 3] {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("pressure", self.pressure),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_names() {
        let r = Reading::new(21.5, 40.0, 1012.3);
        assert_eq!(
            r.fields(),
            [
                ("temperature", 21.5),
                ("humidity", 40.0),
                ("pressure", 1012.3)
            ]
        );
    }
}
