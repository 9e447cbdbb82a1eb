mod common;

use common::{MockI2c, MockPin, MockTouchSpi, EEPROM_ADDR, MPU_ADDR};

use embedded_hal::i2c::ErrorKind;
use trip_computer::drivers::at24::At24;
use trip_computer::drivers::mpu6050::Mpu6050;
use trip_computer::drivers::xpt2046::{self, Xpt2046};
use trip_computer::record::TripRecordStore;
use trip_computer::state::Vec3;
use trip_computer::touch::TouchPanel;

#[test]
fn mpu6050_wakes_and_reads_big_endian_axes() {
    let mut bus = MockI2c::new();
    bus.imu.accel = [-2, 16384, 300];
    bus.imu.gyro = [131, -131, 7];
    let mut imu = Mpu6050::new();

    imu.init(&mut bus).unwrap();
    assert!(bus.imu.awake);
    assert_eq!(bus.writes[0], (MPU_ADDR, vec![0x6B, 0x00]));
    assert_eq!(imu.read_who_am_i(&mut bus).unwrap(), 0x68);

    let sample = imu.read_sample(&mut bus).unwrap();
    assert_eq!(sample.accel, Vec3::new(-2, 16384, 300));
    assert_eq!(sample.gyro, Vec3::new(131, -131, 7));
    // Accel then gyro register pointers.
    assert!(bus.writes.contains(&(MPU_ADDR, vec![0x3B])));
    assert!(bus.writes.contains(&(MPU_ADDR, vec![0x43])));
}

#[test]
fn mpu6050_error_propagates() {
    let mut bus = MockI2c::new();
    bus.imu.fail = true;
    assert!(Mpu6050::new().read_sample(&mut bus).is_err());
}

#[test]
fn at24_word_is_little_endian_with_two_byte_address() {
    let mut bus = MockI2c::new();
    let mut eeprom = At24::new();

    eeprom.write_u32(&mut bus, 0x0010, 0x1234_5678).unwrap();
    assert_eq!(
        bus.writes[0],
        (EEPROM_ADDR, vec![0x00, 0x10, 0x78, 0x56, 0x34, 0x12])
    );
    assert_eq!(eeprom.read_u32(&mut bus, 0x0010).unwrap(), 0x1234_5678);
}

#[test]
fn at24_splits_writes_at_page_boundaries() {
    let mut bus = MockI2c::new();
    let mut eeprom = At24::new();
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];

    eeprom.write(&mut bus, 0x001C, &data).unwrap();
    assert_eq!(bus.eeprom.writes, 2);
    assert_eq!(bus.writes[0], (EEPROM_ADDR, vec![0x00, 0x1C, 1, 2, 3, 4]));
    assert!(bus.writes.contains(&(EEPROM_ADDR, vec![0x00, 0x20, 5, 6, 7, 8])));

    let mut back = [0u8; 8];
    eeprom.read(&mut bus, 0x001C, &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn at24_long_write_spans_pages() {
    let mut bus = MockI2c::new();
    let mut eeprom = At24::new();
    let data: Vec<u8> = (0..70).collect();

    eeprom.write(&mut bus, 0x0000, &data).unwrap();
    // 32 + 32 + 6
    assert_eq!(bus.eeprom.writes, 3);
    let mut back = vec![0u8; 70];
    eeprom.read(&mut bus, 0x0000, &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn at24_polls_until_write_cycle_ends() {
    let mut bus = MockI2c::new();
    bus.eeprom.write_cycle_polls = 40;
    let mut eeprom = At24::new();

    eeprom.write_u32(&mut bus, 0, 7).unwrap();
    assert_eq!(bus.eeprom.busy, 0);
    assert_eq!(eeprom.read_u32(&mut bus, 0).unwrap(), 7);
}

#[test]
fn at24_gives_up_on_a_stuck_device() {
    let mut bus = MockI2c::new();
    bus.eeprom.write_cycle_polls = u32::MAX;
    let mut eeprom = At24::new();

    let err = eeprom.write_u32(&mut bus, 0, 7).unwrap_err();
    assert!(matches!(err, ErrorKind::NoAcknowledge(_)));
}

#[test]
fn record_store_round_trip_through_eeprom() {
    let mut bus = MockI2c::new();
    let mut store = TripRecordStore::default();

    let first = store.merge(&mut bus, 500, 20).unwrap();
    assert_eq!((first.total_distance_m, first.avg_speed_kmh), (500, 10));

    let second = store.merge(&mut bus, 300, 30).unwrap();
    assert_eq!((second.total_distance_m, second.avg_speed_kmh), (800, 20));
    assert_eq!(store.load(&mut bus).unwrap(), second);
}

#[test]
fn xpt2046_shifts_out_twelve_bits() {
    let mut spi = MockTouchSpi::default();
    spi.queue([4095, 2000, 1], [0, 100, 3840]);
    let mut panel = Xpt2046::new(spi, MockPin::default());

    let samples = panel.read_samples().unwrap();
    assert_eq!(samples.x, [4095, 2000, 1]);
    assert_eq!(samples.y, [0, 100, 3840]);

    let (spi, cs) = panel.release();
    assert_eq!(spi.commands.last(), Some(&xpt2046::CMD_POWER_DOWN));
    assert_eq!(cs.selects, 7);
    assert!(!cs.low);
}

#[test]
fn xpt2046_releases_chip_select_on_bus_error() {
    let mut spi = MockTouchSpi::default();
    spi.fail = true;
    let mut panel = Xpt2046::new(spi, MockPin::default());

    assert!(matches!(panel.read_x(), Err(xpt2046::Error::Spi(_))));
    let (_, cs) = panel.release();
    assert!(!cs.low);
}
