//! bm83-bridge firmware for the nRF52840.
//!
//! Tasks:
//! - **bridge**: owns the UARTE to the BM83 and the protocol engine. Drains
//!   received bytes into the RX queue, runs [`Bm83::process`] until no more
//!   frames are complete, executes application requests and flushes the TX
//!   queue.
//! - **app**: reacts to [`BtEvent`]s (power on after boot, AVRCP setup
//!   once a phone connects, link back after a drop, metadata refresh on
//!   track change).
//! - **poll**: asks for the module's link status on a fixed interval.
//!
//! Build: `cargo build --release --features embedded --target thumbv7em-none-eabihf`

#![no_std]
#![no_main]

use bm83_bridge::bm83::protocol::{avrcp_pdu, linked_device_query, AvrcpEvent};
use bm83_bridge::bm83::{commands, Bm83, BtEvent, LinkType, Profile};
use bm83_bridge::config::{
    BT_UART_BAUD, LINK_STATUS_POLL_MS, PROCESS_TICK_MS, RX_QUEUE_SIZE, TX_QUEUE_SIZE,
};
use bm83_bridge::queue::ByteQueue;
use defmt::{info, unwrap, warn, Format};
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::peripherals::{TIMER0, UARTE0};
use embassy_nrf::{bind_interrupts, peripherals, uarte};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Ticker, Timer};
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

/// Driver-side buffers backing the buffered UARTE.
const UART_BUFFER_SIZE: usize = 256;

static UART_RX_BUF: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();
static UART_TX_BUF: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();

/// Notifications from the bridge to the application.
static EVENTS: Channel<CriticalSectionRawMutex, BtEvent, 8> = Channel::new();

/// Work the application asks the bridge to do. The bridge owns the engine
/// state, so it builds the actual commands.
static REQUESTS: Channel<CriticalSectionRawMutex, Request, 8> = Channel::new();

#[derive(Clone, Copy, Format)]
enum Request {
    PowerOn,
    ReadPairedDevices,
    ReadLinkStatus,
    ReadDeviceName,
    Reconnect,
    AvrcpGetCapabilities,
    AvrcpRegister(AvrcpEvent),
    AvrcpGetMetadata,
}

type Uart = BufferedUarte<'static, UARTE0, TIMER0>;

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("bm83-bridge starting");

    // BM83 default UART settings: 8N1 at BT_UART_BAUD.
    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = uarte::Baudrate::BAUD115200;
    defmt::debug!("BT UART at {} baud", BT_UART_BAUD);

    let uart = BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        Irqs,
        p.P0_08,
        p.P0_06,
        config,
        UART_RX_BUF.init([0u8; UART_BUFFER_SIZE]),
        UART_TX_BUF.init([0u8; UART_BUFFER_SIZE]),
    );

    let reset = Output::new(p.P0_27, Level::Low, OutputDrive::Standard);
    let mfb = Output::new(p.P0_26, Level::Low, OutputDrive::Standard);

    unwrap!(spawner.spawn(bridge_task(uart, reset, mfb)));
    unwrap!(spawner.spawn(app_task()));
    unwrap!(spawner.spawn(poll_task()));
}

#[embassy_executor::task]
async fn bridge_task(mut uart: Uart, mut reset: Output<'static>, mut mfb: Output<'static>) {
    // Hold MFB high through reset so the module boots into application mode.
    mfb.set_high();
    reset.set_low();
    Timer::after(Duration::from_millis(10)).await;
    reset.set_high();

    let mut engine = Bm83::new();
    let mut rx_queue = ByteQueue::<RX_QUEUE_SIZE>::new();
    let mut tx_queue = ByteQueue::<TX_QUEUE_SIZE>::new();
    let mut buf = [0u8; 64];

    loop {
        match select3(
            uart.read(&mut buf),
            REQUESTS.receive(),
            Timer::after(Duration::from_millis(PROCESS_TICK_MS)),
        )
        .await
        {
            Either3::First(Ok(n)) => {
                let taken = rx_queue.extend_from_slice(&buf[..n]);
                if taken < n {
                    warn!("BT: RX queue full, dropped {} bytes", n - taken);
                }
            }
            Either3::First(Err(e)) => warn!("BT: UART read error: {}", e),
            Either3::Second(request) => handle_request(&mut engine, &mut tx_queue, request),
            Either3::Third(()) => {}
        }

        // RX traffic can win the select every time; never leave requests behind.
        while let Ok(request) = REQUESTS.try_receive() {
            handle_request(&mut engine, &mut tx_queue, request);
        }

        // One frame per call; keep going while frames are being consumed.
        loop {
            let before = rx_queue.len();
            for event in engine.process(&mut rx_queue, &mut tx_queue, now_ms()) {
                // The app task sends requests back to us; blocking here could
                // park both tasks.
                if EVENTS.try_send(event).is_err() {
                    warn!("BT: Event queue full, dropped {}", event);
                }
            }
            if rx_queue.len() == before {
                break;
            }
        }

        flush(&mut uart, &mut tx_queue).await;
    }
}

fn handle_request(engine: &mut Bm83, tx: &mut ByteQueue<TX_QUEUE_SIZE>, request: Request) {
    let now = now_ms();
    let state = engine.state_mut();
    let command = match request {
        Request::PowerOn => {
            for command in commands::power_on() {
                engine.send(&command, tx, now);
            }
            return;
        }
        Request::ReadPairedDevices => commands::read_paired_devices(),
        Request::ReadLinkStatus => commands::read_link_status(),
        Request::ReadDeviceName => {
            commands::read_linked_device_information(state, linked_device_query::NAME)
        }
        Request::Reconnect => {
            // Each attempt counts against the budget until A2DP opens again.
            if state.status.pairing_exhausted(Profile::A2dp) {
                warn!("BT: Link back abandoned after repeated failures");
                return;
            }
            state.status.record_pairing_error(Profile::A2dp);
            commands::link_back_last_device(state)
        }
        Request::AvrcpGetCapabilities => commands::avrcp_get_capabilities(state),
        Request::AvrcpRegister(event) => {
            if !state.active.avrcp_caps.supports(event) {
                return;
            }
            commands::avrcp_register_notification(state, event.code())
        }
        Request::AvrcpGetMetadata => commands::avrcp_get_element_attributes(state),
    };
    engine.send(&command, tx, now);
}

async fn flush(uart: &mut Uart, tx: &mut ByteQueue<TX_QUEUE_SIZE>) {
    let mut chunk = [0u8; 64];
    while !tx.is_empty() {
        let mut n = 0;
        while n < chunk.len() {
            match tx.pop() {
                Some(b) => {
                    chunk[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        if let Err(e) = uart.write_all(&chunk[..n]).await {
            warn!("BT: UART write error: {}", e);
            tx.clear();
            return;
        }
    }
}

#[embassy_executor::task]
async fn app_task() {
    loop {
        let event = EVENTS.receive().await;
        info!("BT event: {}", event);

        match event {
            BtEvent::Boot => {
                REQUESTS.send(Request::PowerOn).await;
                REQUESTS.send(Request::ReadPairedDevices).await;
            }
            BtEvent::DeviceConnected => {
                REQUESTS.send(Request::AvrcpGetCapabilities).await;
            }
            BtEvent::DeviceDisconnected => {
                REQUESTS.send(Request::Reconnect).await;
            }
            BtEvent::DeviceLinkConnected(LinkType::A2dp) => {
                REQUESTS.send(Request::ReadDeviceName).await;
            }
            BtEvent::AvrcpPduChange { kind, value } => {
                on_avrcp_change(kind, value).await;
            }
            _ => {}
        }
    }
}

/// Keep AVRCP notifications registered and metadata fresh.
///
/// Notifications fire once; each CHANGED report has to be re-registered.
async fn on_avrcp_change(kind: u8, value: u8) {
    if kind == avrcp_pdu::GET_CAPABILITIES {
        for event in [
            AvrcpEvent::PlaybackStatusChanged,
            AvrcpEvent::TrackChanged,
            AvrcpEvent::VolumeChanged,
        ] {
            REQUESTS.send(Request::AvrcpRegister(event)).await;
        }
        return;
    }

    match AvrcpEvent::from_code(kind) {
        Some(AvrcpEvent::TrackChanged) => {
            REQUESTS.send(Request::AvrcpGetMetadata).await;
            // value 0x01 marks the INTERIM reply to our own registration.
            if value == 0x00 {
                REQUESTS
                    .send(Request::AvrcpRegister(AvrcpEvent::TrackChanged))
                    .await;
            }
        }
        Some(event @ (AvrcpEvent::PlaybackStatusChanged | AvrcpEvent::VolumeChanged)) => {
            REQUESTS.send(Request::AvrcpRegister(event)).await;
        }
        _ => {}
    }
}

#[embassy_executor::task]
async fn poll_task() {
    let mut ticker = Ticker::every(Duration::from_millis(LINK_STATUS_POLL_MS));
    loop {
        ticker.next().await;
        REQUESTS.send(Request::ReadLinkStatus).await;
    }
}
