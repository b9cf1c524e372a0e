#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;
use rtic::app;

use wokwi_stopwatch::TickFlag;

/// Raised by the alarm interrupt, consumed by the idle loop.
static TICK_PENDING: TickFlag = TickFlag::new();

#[app(device = rp_pico::hal::pac, peripherals = true)]
mod app {
    use rp_pico::hal::{clocks::init_clocks_and_plls, sio::Sio, timer::Timer, watchdog::Watchdog};

    use wokwi_stopwatch::board::{AlarmTicker, ButtonLine, Locked, SioPorts};
    use wokwi_stopwatch::config::{BUTTON_LINES, DISPLAY_LAYOUT, TIMING};
    use wokwi_stopwatch::{
        ControlHandler, ElapsedTime, Gpio, LoopState, MainLoop, Multiplexer, SegmentDisplay, SharedClock,
        TickSource,
    };

    const XTAL_FREQ_HZ: u32 = 12_000_000;

    // Shared resources (accessed by multiple tasks)
    #[shared]
    struct Shared {
        clock: ElapsedTime,
        display: SegmentDisplay<SioPorts>,
        ticker: AlarmTicker,
    }

    // Local resources (accessed by single tasks)
    #[local]
    struct Local {
        buttons: [ButtonLine; 3],
        control: ControlHandler,
        main_loop: MainLoop,
        idle_delay: Timer,
        button_delay: Timer,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut pac = ctx.device;
        let mut watchdog = Watchdog::new(pac.WATCHDOG);
        let sio = Sio::new(pac.SIO);

        let clocks = defmt::unwrap!(init_clocks_and_plls(
            XTAL_FREQ_HZ,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
        .ok());

        let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
        let alarm = defmt::unwrap!(timer.alarm_0());

        let pins = rp_pico::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );

        // Selectors on GPIO0..=5, BCD digit on GPIO16..=19. Converting sets the
        // SIO function; after that the ports drive them.
        pins.gpio0.into_push_pull_output();
        pins.gpio1.into_push_pull_output();
        pins.gpio2.into_push_pull_output();
        pins.gpio3.into_push_pull_output();
        pins.gpio4.into_push_pull_output();
        pins.gpio5.into_push_pull_output();
        pins.gpio16.into_push_pull_output();
        pins.gpio17.into_push_pull_output();
        pins.gpio18.into_push_pull_output();
        pins.gpio19.into_push_pull_output();

        // Reset on GPIO26, pause on GPIO27, resume on GPIO10.
        let [reset, pause, resume] = BUTTON_LINES;
        let mut buttons = [
            ButtonLine::new(pins.gpio26.into_floating_input().into_dyn_pin(), reset.event),
            ButtonLine::new(pins.gpio27.into_floating_input().into_dyn_pin(), pause.event),
            ButtonLine::new(pins.gpio10.into_floating_input().into_dyn_pin(), resume.event),
        ];

        // SAFETY: every pin above is in SIO function and its HAL handle is
        // either dropped or only used for interrupt control.
        let mut gpio = Gpio::new(unsafe { SioPorts::steal() });
        for (config, line) in BUTTON_LINES.iter().zip(buttons.iter_mut()) {
            defmt::unwrap!(config.arm(&mut gpio, line));
        }
        let display = defmt::unwrap!(SegmentDisplay::new(gpio, DISPLAY_LAYOUT));

        let mut ticker = AlarmTicker::new(alarm, timer);
        defmt::unwrap!(ticker.configure_periodic(TIMING.tick_period));
        ticker.enable();

        defmt::info!(
            "stopwatch running: dwell {} ms, debounce {} ms",
            TIMING.digit_dwell.to_millis(),
            TIMING.debounce.to_millis()
        );

        (
            Shared {
                clock: ElapsedTime::ZERO,
                display,
                ticker,
            },
            Local {
                buttons,
                control: ControlHandler::new(TIMING.debounce),
                main_loop: MainLoop::new(Multiplexer::new(TIMING.digit_dwell)),
                idle_delay: timer,
                button_delay: timer,
            },
            init::Monotonics(),
        )
    }

    // Foreground: multiplex the display forever, advancing on each pending tick.
    #[idle(shared = [clock, display], local = [main_loop, idle_delay])]
    fn idle(ctx: idle::Context) -> ! {
        let mut clock = Locked(ctx.shared.clock);
        let mut display = Locked(ctx.shared.display);
        loop {
            let state = ctx.local.main_loop.step(
                &crate::TICK_PENDING,
                &mut clock,
                &mut display,
                ctx.local.idle_delay,
            );
            if state == LoopState::TickProcessing {
                defmt::trace!("tick {}", clock.snapshot());
            }
        }
    }

    // Hardware Task: Timer Interrupt (1Hz)
    #[task(binds = TIMER_IRQ_0, priority = 1, shared = [ticker])]
    fn timer_tick(mut ctx: timer_tick::Context) {
        crate::TICK_PENDING.raise();
        ctx.shared.ticker.lock(|t| t.rearm());
    }

    // Hardware Task: GPIO Interrupt (reset, pause, resume buttons)
    #[task(
        binds = IO_IRQ_BANK0,
        priority = 1,
        shared = [clock, display, ticker],
        local = [buttons, control, button_delay]
    )]
    fn button_press(ctx: button_press::Context) {
        let buttons = ctx.local.buttons;
        let control = ctx.local.control;
        let delay = ctx.local.button_delay;

        (ctx.shared.clock, ctx.shared.display, ctx.shared.ticker).lock(|clock, display, ticker| {
            for line in buttons.iter_mut() {
                if let Some(event) = line.take_event() {
                    defmt::info!("{}", event);
                    control.dispatch(event, clock, display, ticker, delay);
                }
            }
        });
    }
}
