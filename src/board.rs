use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::Moder;
use embassy_stm32::pac::timer::vals::CcmrInputCcs;
use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::Config;

use trip_computer::config::{CAPTURE_TICK_HZ, CAPTURE_TIMER_MODULUS};

/// TIM5 kernel clock: APB1 (42 MHz) doubled because APB1 is prescaled.
const TIM5_CLOCK_HZ: u32 = 84_000_000;
/// PA0 alternate function for TIM5_CH1.
const AF_TIM5: u8 = 2;

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    /// 8 MHz crystal → 168 MHz core, 48 MHz for USB.
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}

/// Wheel sensor on PA0: TIM5 channel 1 input capture at 1 MHz, update event
/// every 0x10000 ticks. Capture and update both raise the TIM5 interrupt.
///
/// Takes ownership of PA0 and TIM5 so nothing else can claim them.
pub fn init_wheel_capture(_pin: embassy_stm32::peripherals::PA0, _tim: embassy_stm32::peripherals::TIM5) {
    pac::RCC.apb1enr().modify(|w| w.set_tim5en(true));

    pac::GPIOA.moder().modify(|w| w.set_moder(0, Moder::ALTERNATE));
    pac::GPIOA.afr(0).modify(|w| w.set_afr(0, AF_TIM5));

    let tim = pac::TIM5;
    tim.cr1().modify(|w| w.set_cen(false));
    tim.psc().write_value((TIM5_CLOCK_HZ / CAPTURE_TICK_HZ - 1) as u16);
    tim.arr().write_value(CAPTURE_TIMER_MODULUS - 1);
    tim.cnt().write_value(0);

    // CC1 mapped on TI1, rising edge.
    tim.ccmr_input(0).modify(|w| w.set_ccs(0, CcmrInputCcs::TI4));
    tim.ccer().modify(|w| {
        w.set_ccp(0, false);
        w.set_cce(0, true);
    });

    tim.egr().write(|w| w.set_ug(true));
    tim.sr().write_value(pac::timer::regs::SrGp(0));
    tim.dier().modify(|w| {
        w.set_uie(true);
        w.set_ccie(0, true);
    });
    tim.cr1().modify(|w| w.set_cen(true));
}
