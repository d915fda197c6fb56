use evdev::{AbsoluteAxisCode, Device, KeyCode};
use log::{info, warn};
use nalgebra::Point2;

/// Something that reports a two-axis position, each axis in `[-1, 1]`.
pub trait PointerSource: Send {
    /// `None` when there is nothing to read this tick.
    fn axes(&mut self) -> Option<[f32; 2]>;
    fn name(&self) -> &str;
}

/// Stand-in when no joystick is attached. The cursor stays on the center.
pub struct NoDevice;

impl PointerSource for NoDevice {
    fn axes(&mut self) -> Option<[f32; 2]> { None }

    fn name(&self) -> &str { "No device" }
}

/// First physical joystick or gamepad found under `/dev/input`.
pub struct Joystick {
    device: Device,
    name: String,
    failed: bool,
}

fn normalize(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }
    let span = (maximum - minimum) as f32;
    ((value - minimum) as f32 / span * 2.0 - 1.0).clamp(-1.0, 1.0)
}

fn is_joystick(device: &Device) -> bool {
    let has_axes = device
        .supported_absolute_axes()
        .is_some_and(|axes| axes.contains(AbsoluteAxisCode::ABS_X) && axes.contains(AbsoluteAxisCode::ABS_Y));
    // touchpads and tablets have X/Y too, the buttons tell them apart
    let has_buttons = device.supported_keys().is_some_and(|keys| {
        keys.contains(KeyCode::BTN_TRIGGER) || keys.contains(KeyCode::BTN_SOUTH) || keys.contains(KeyCode::BTN_THUMB)
    });
    has_axes && has_buttons
}

impl Joystick {
    pub fn open_first() -> Option<Self> {
        let (path, device) = evdev::enumerate().find(|(_, device)| is_joystick(device))?;
        let name = device.name().unwrap_or("Unnamed joystick").to_owned();
        info!("Using {} at {}", name, path.display());
        Some(Self { device, name, failed: false })
    }
}

impl PointerSource for Joystick {
    fn axes(&mut self) -> Option<[f32; 2]> {
        if self.failed {
            return None;
        }
        let state = match self.device.get_abs_state() {
            Ok(state) => state,
            Err(err) => {
                warn!("Lost {}: {}. Holding the cursor at the center.", self.name, err);
                self.failed = true;
                return None;
            }
        };
        let x = state[AbsoluteAxisCode::ABS_X.0 as usize];
        let y = state[AbsoluteAxisCode::ABS_Y.0 as usize];
        Some([normalize(x.value, x.minimum, x.maximum), normalize(y.value, y.minimum, y.maximum)])
    }

    fn name(&self) -> &str { &self.name }
}

/// Opens a joystick if one is plugged in, otherwise falls back to [`NoDevice`].
pub fn open_default() -> Box<dyn PointerSource> {
    match Joystick::open_first() {
        Some(joystick) => Box::new(joystick),
        None => {
            warn!("No joystick found, the cursor will stay on the start circle");
            Box::new(NoDevice)
        }
    }
}

/// Maps a pointer source into screen space around `center`.
pub struct Pointer {
    source: Box<dyn PointerSource>,
    center: Point2<f32>,
    distance: f32,
}

impl Pointer {
    pub fn new(source: Box<dyn PointerSource>, center: Point2<f32>, distance: f32) -> Self {
        Self { source, center, distance }
    }

    pub fn name(&self) -> &str { self.source.name() }

    pub fn sample(&mut self) -> Point2<f32> {
        match self.source.axes() {
            Some([x, y]) => Point2::new(self.center.x + x * self.distance, self.center.y + y * self.distance),
            None => self.center,
        }
    }
}

/// Cursor displacement between two consecutive polls.
pub fn speed(previous: Point2<f32>, current: Point2<f32>) -> f32 { nalgebra::distance(&previous, &current) }

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Replays a fixed list of axis readings, repeating the last one forever.
    pub(crate) struct Scripted {
        samples: Vec<[f32; 2]>,
        next: usize,
    }

    impl Scripted {
        pub(crate) fn new(samples: Vec<[f32; 2]>) -> Self { Self { samples, next: 0 } }
    }

    impl PointerSource for Scripted {
        fn axes(&mut self) -> Option<[f32; 2]> {
            let sample = self.samples.get(self.next).or(self.samples.last()).copied();
            self.next += 1;
            sample
        }

        fn name(&self) -> &str { "Scripted" }
    }

    #[test]
    fn normalize_maps_the_device_range() {
        assert_eq!(normalize(0, 0, 255), -1.0);
        assert_eq!(normalize(255, 0, 255), 1.0);
        assert!(normalize(128, 0, 255).abs() < 0.01);
        assert_eq!(normalize(-32768, -32768, 32767), -1.0);
        assert_eq!(normalize(40000, -32768, 32767), 1.0);
        assert_eq!(normalize(12, 5, 5), 0.0);
    }

    #[test]
    fn no_device_stays_on_center() {
        let center = Point2::new(400.0, 400.0);
        let mut pointer = Pointer::new(Box::new(NoDevice), center, 200.0);
        for _ in 0..3 {
            assert_eq!(pointer.sample(), center);
        }
        assert_eq!(pointer.name(), "No device");
    }

    #[test]
    fn axes_scale_by_distance() {
        let center = Point2::new(400.0, 400.0);
        let source = Scripted::new(vec![[1.0, 0.0], [-0.5, 0.25]]);
        let mut pointer = Pointer::new(Box::new(source), center, 200.0);
        assert_eq!(pointer.sample(), Point2::new(600.0, 400.0));
        assert_eq!(pointer.sample(), Point2::new(300.0, 450.0));
        // script exhausted, the last reading sticks
        assert_eq!(pointer.sample(), Point2::new(300.0, 450.0));
    }

    #[test]
    fn speed_is_euclidean() {
        assert_eq!(speed(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)), 5.0);
        assert_eq!(speed(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)), 0.0);
    }
}
