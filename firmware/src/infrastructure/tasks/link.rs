//! Broker link session task
//!
//! Drives the MQTT session end to end: TCP + MQTT connect, entity
//! announcement, the receive/keepalive loop and the reconnect policy.
//!
//! Two cadences interleave inside an established session: transport I/O is
//! drained every few milliseconds while the keepalive ping runs on its own
//! multi-second ticker. Received messages land in the bounded inbound
//! queue and are processed one per cycle, so a burst can never stall the
//! receive path. All registry work happens under the context lock and emits
//! wire traffic into the session outbox, which is flushed here - making
//! this task the single observer of transport failures.
//!
//! Reconnect failures are counted by `LinkHealth`; past the threshold the
//! task stops retrying and resets the device.

use core::convert::Infallible;
use core::fmt::Write as _;

use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_time::{Duration, Ticker, Timer, with_timeout};
use heapless::String;
use log::{info, warn};
use matrixclock_hass::MAX_TOPIC_LEN;
use matrixclock_link::{
    BufferedOutbox, ConnectionState, InboundQueue, LinkHealth, LinkRequest, RetryDirective,
};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

use crate::config;
use crate::context::AppContext;
use crate::controllers::entities::{self, LocalCommand};
use crate::infrastructure::drivers::resolve_host;

const MQTT_BUF_SIZE: usize = 1024;
const MAX_PAYLOAD_LEN: usize = 512;
const OUTBOX_DEPTH: usize = 16;
const INBOUND_DEPTH: usize = 16;
const COMMAND_DEPTH: usize = 4;

type SessionOutbox = BufferedOutbox<OUTBOX_DEPTH, MAX_TOPIC_LEN, MAX_PAYLOAD_LEN>;
type SessionQueue = InboundQueue<INBOUND_DEPTH, MAX_TOPIC_LEN, MAX_PAYLOAD_LEN>;
type CommandSender = Sender<'static, CriticalSectionRawMutex, LocalCommand, COMMAND_DEPTH>;

/// Local intents (button presses) queued for the session loop.
static COMMANDS: Channel<CriticalSectionRawMutex, LocalCommand, COMMAND_DEPTH> = Channel::new();

pub(crate) fn command_sender() -> CommandSender {
    COMMANDS.sender()
}

enum SessionError {
    /// Connect phase failed (DNS, TCP or MQTT CONNECT).
    Connect,
    /// The established session died.
    Link(ReasonCode),
}

#[embassy_executor::task]
pub(crate) async fn link_task(stack: Stack<'static>, ctx: &'static AppContext) {
    let device_id = client_id(ctx);
    let mut health = LinkHealth::new(config::MAX_RECONNECT_FAILURES);
    let mut queue = SessionQueue::new();
    info!("link: client id '{}'", device_id);

    loop {
        let error = match run_session(stack, ctx, &mut health, &device_id, &mut queue).await {
            Ok(never) => match never {},
            Err(error) => error,
        };

        match error {
            SessionError::Connect => {
                if health.on_connect_failure() == RetryDirective::Reset {
                    ctx.connectivity.set(health.state());
                    esp_hal::system::software_reset();
                }
            }
            SessionError::Link(code) => {
                warn!("link: session lost: {:?}", code);
                health.on_link_lost();
            }
        }
        ctx.connectivity.set(health.state());
        Timer::after(config::RECONNECT_DELAY).await;
    }
}

async fn run_session(
    stack: Stack<'static>,
    ctx: &'static AppContext,
    health: &mut LinkHealth,
    device_id: &str,
    queue: &mut SessionQueue,
) -> Result<Infallible, SessionError> {
    let mut rx_buffer = [0u8; 1024];
    let mut tx_buffer = [0u8; 1024];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(60)));

    let broker_addr = resolve_host(stack, config::MQTT.host).await.map_err(|()| {
        warn!("link: cannot resolve broker host '{}'", config::MQTT.host);
        SessionError::Connect
    })?;

    info!(
        "link: connecting to {}:{}",
        config::MQTT.host,
        config::MQTT.port()
    );
    if let Err(error) = socket.connect((broker_addr, config::MQTT.port())).await {
        socket.abort();
        warn!("link: TCP connect failed: {:?}", error);
        return Err(SessionError::Connect);
    }

    let mut mqtt_config: ClientConfig<'_, 5, CountingRng> =
        ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
    mqtt_config.add_client_id(device_id);
    if !config::MQTT.username.is_empty() {
        mqtt_config.add_username(config::MQTT.username);
        mqtt_config.add_password(config::MQTT.password);
    }
    mqtt_config.add_max_subscribe_qos(QualityOfService::QoS1);
    mqtt_config.max_packet_size = MQTT_BUF_SIZE as u32;

    let mut write_buffer = [0u8; MQTT_BUF_SIZE];
    let mut recv_buffer = [0u8; MQTT_BUF_SIZE];
    let mut client: MqttClient<'_, TcpSocket<'_>, 5, CountingRng> = MqttClient::new(
        socket,
        &mut write_buffer,
        MQTT_BUF_SIZE,
        &mut recv_buffer,
        MQTT_BUF_SIZE,
        mqtt_config,
    );

    if let Err(code) = client.connect_to_broker().await {
        warn!("link: MQTT connect failed: {:?}", code);
        return Err(SessionError::Connect);
    }

    // Announce the entity set. First contact registers it; reconnects
    // re-issue discovery because the broker may have dropped retained
    // state while the link was down.
    let mut outbox = SessionOutbox::new();
    ctx.entities.lock(|cell| {
        let mut registry = cell.borrow_mut();
        if registry.is_empty() {
            if let Err(error) = entities::register_entities(&mut registry, &mut outbox) {
                warn!("link: entity registration failed: {}", error);
            }
        } else {
            registry.advertise_entities(&mut outbox);
        }
    });
    flush_outbox(&mut client, &mut outbox)
        .await
        .map_err(SessionError::Link)?;

    health.on_connect_success();
    ctx.connectivity.set(ConnectionState::Online);
    info!("link: online");

    let mut keepalive = Ticker::every(config::KEEPALIVE_INTERVAL);
    loop {
        enum Cycle {
            Ping,
            Idle,
            Fail(ReasonCode),
        }

        // Either a keepalive ping is due, or one poll window of transport
        // I/O is drained into the inbound queue. The received borrow ends
        // with this block; processing happens below without the client
        // borrowed.
        let cycle = {
            match select(
                keepalive.next(),
                with_timeout(config::IO_POLL_INTERVAL, client.receive_message()),
            )
            .await
            {
                Either::First(()) => Cycle::Ping,
                Either::Second(Ok(Ok((topic, payload)))) => {
                    let _ = queue.push(topic, payload);
                    Cycle::Idle
                }
                Either::Second(Ok(Err(code))) => Cycle::Fail(code),
                Either::Second(Err(_)) => Cycle::Idle,
            }
        };
        match cycle {
            Cycle::Ping => client.send_ping().await.map_err(SessionError::Link)?,
            Cycle::Fail(code) => return Err(SessionError::Link(code)),
            Cycle::Idle => {}
        }

        // One queued message per cycle, strictly in arrival order
        if let Some(message) = queue.pop() {
            ctx.entities.lock(|cell| {
                cell.borrow_mut()
                    .process_message(&message.topic, &message.payload, &mut outbox);
            });
        }

        while let Ok(command) = COMMANDS.try_receive() {
            ctx.entities.lock(|cell| {
                entities::apply_local_command(command, &mut cell.borrow_mut(), &mut outbox);
            });
        }

        flush_outbox(&mut client, &mut outbox)
            .await
            .map_err(SessionError::Link)?;
    }
}

async fn flush_outbox<'a, T>(
    client: &mut MqttClient<'a, T, 5, CountingRng>,
    outbox: &mut SessionOutbox,
) -> Result<(), ReasonCode>
where
    T: embedded_io_async::Read + embedded_io_async::Write,
{
    while let Some(request) = outbox.pop() {
        match request {
            LinkRequest::Publish {
                topic,
                payload,
                retain,
            } => {
                client
                    .send_message(&topic, &payload, QualityOfService::QoS1, retain)
                    .await?;
            }
            LinkRequest::Subscribe { topic } => {
                client.subscribe_to_topic(&topic).await?;
            }
        }
    }
    Ok(())
}

fn client_id(ctx: &AppContext) -> String<24> {
    let host_id = ctx
        .entities
        .lock(|cell| cell.borrow().identity().host_id.clone());
    let mut id = String::new();
    let _ = write!(id, "{}-{}", config::ENTITY_PREFIX, host_id);
    id
}
