//! In-memory Remote API: demo mode and the test suites run against it.

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Page, PageQuery, Remote, paginate};
use crate::dates;
use crate::error::{ApiError, ApiResult};
use crate::model::{Booking, Entity, Location, Role, Room, User};

pub struct MemoryApi<E> {
    rows: Mutex<Vec<E>>,
    next_id: AtomicI64,
    latency: Duration,
    fetch_delays: StdMutex<VecDeque<Duration>>,
    failures: StdMutex<VecDeque<ApiError>>,
    /// Page fetches only; single-record lookups count in `lookup_calls`.
    pub fetch_calls: AtomicU64,
    pub lookup_calls: AtomicU64,
    pub mutation_calls: AtomicU64,
}

impl<E: Entity> MemoryApi<E> {
    pub fn new(seed: Vec<E>) -> Self {
        let next = seed.iter().map(Entity::id).max().unwrap_or(0) + 1;
        Self {
            rows: Mutex::new(seed),
            next_id: AtomicI64::new(next),
            latency: Duration::ZERO,
            fetch_delays: StdMutex::new(VecDeque::new()),
            failures: StdMutex::new(VecDeque::new()),
            fetch_calls: AtomicU64::new(0),
            lookup_calls: AtomicU64::new(0),
            mutation_calls: AtomicU64::new(0),
        }
    }

    /// Delay applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next fetch sleeps `delay` instead of the base latency. Queued in order.
    pub fn push_fetch_delay(&self, delay: Duration) {
        self.fetch_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(delay);
    }

    /// The next call (of any kind) fails with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<E> {
        self.rows.lock().await.clone()
    }

    fn injected_failure(&self) -> Option<ApiError> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::Server {
        status: 404,
        message: format!("record {id} not found"),
    }
}

#[async_trait]
impl<E: Entity> Remote<E> for MemoryApi<E> {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Page<E>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .fetch_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.latency);
        self.pause(delay).await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let scoped: Vec<E> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| r.in_scope(query.scope))
            .cloned()
            .collect();
        Ok(paginate(scoped, query))
    }

    async fn fetch_one(&self, id: i64) -> ApiResult<E> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.latency).await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let rows = self.rows.lock().await;
        rows.iter().find(|r| r.id() == id).cloned().ok_or_else(|| not_found(id))
    }

    async fn create(&self, record: &E) -> ApiResult<Option<E>> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.latency).await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let mut created = record.clone();
        created.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.rows.lock().await.push(created.clone());
        Ok(Some(created))
    }

    async fn update(&self, id: i64, record: &E) -> ApiResult<Option<E>> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.latency).await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let mut rows = self.rows.lock().await;
        let slot = rows.iter_mut().find(|r| r.id() == id).ok_or_else(|| not_found(id))?;
        let mut updated = record.clone();
        updated.set_id(id);
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> ApiResult<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.latency).await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let mut rows = self.rows.lock().await;
        let pos = rows.iter().position(|r| r.id() == id).ok_or_else(|| not_found(id))?;
        rows.remove(pos);
        Ok(())
    }
}

/// Sample data for `--demo`.
pub struct DemoData {
    pub users: Vec<User>,
    pub locations: Vec<Location>,
    pub rooms: Vec<Room>,
    pub bookings: Vec<Booking>,
}

impl DemoData {
    pub fn admin(&self) -> Option<&User> {
        self.users.iter().find(|u| u.is_admin())
    }

    pub fn seed() -> Self {
        let names = [
            "Nguyen An", "Tran Binh", "Le Chi", "Pham Dung", "Hoang Giang", "Vu Ha", "Dang Khanh",
            "Bui Lan", "Do Minh", "Ho Nam", "Ngo Oanh", "Duong Phuc",
        ];
        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let id = i as i64 + 1;
                User {
                    id,
                    name: (*name).to_string(),
                    email: format!("user{id}@demo.test"),
                    phone: format!("09{:08}", id * 1_234_567 % 100_000_000),
                    birthday: format!("199{}-0{}-1{}", i % 10, i % 9 + 1, i % 10),
                    gender: i % 2 == 0,
                    role: if id == 1 { Role::Admin } else { Role::User },
                    ..User::default()
                }
            })
            .collect();

        let places = [
            ("Ben Thanh", "Ho Chi Minh", "Viet Nam"),
            ("Hoan Kiem", "Ha Noi", "Viet Nam"),
            ("My Khe", "Da Nang", "Viet Nam"),
            ("Pho Co", "Hoi An", "Viet Nam"),
            ("Bai Chay", "Quang Ninh", "Viet Nam"),
            ("Xuan Huong", "Da Lat", "Viet Nam"),
        ];
        let locations = places
            .iter()
            .enumerate()
            .map(|(i, (name, province, country))| Location {
                id: i as i64 + 1,
                name: (*name).to_string(),
                province: (*province).to_string(),
                country: (*country).to_string(),
                ..Location::default()
            })
            .collect();

        let kinds = ["Studio", "Deluxe", "Family suite", "Loft", "Garden villa"];
        let rooms = (1..=27)
            .map(|id: i64| {
                let idx = id as usize;
                let mut room = Room {
                    id,
                    name: format!("{} room{}", kinds[idx % kinds.len()], 100 + id),
                    guests: (idx % 6 + 1) as u32,
                    bedrooms: (idx % 3 + 1) as u32,
                    beds: (idx % 4 + 1) as u32,
                    baths: (idx % 2 + 1) as u32,
                    description: format!("Bright {} close to the center", kinds[idx % kinds.len()].to_lowercase()),
                    price: 25 + (id as u64 * 7) % 120,
                    location_id: id % places.len() as i64 + 1,
                    ..Room::default()
                };
                room.amenities.wifi = true;
                room.amenities.air_conditioning = idx % 2 == 0;
                room.amenities.kitchen = idx % 3 == 0;
                room.amenities.pool = idx % 5 == 0;
                room.amenities.parking = idx % 4 == 0;
                room
            })
            .collect();

        let start = dates::today();
        let bookings = (1..=18)
            .map(|id: i64| {
                let check_in = start + chrono::Days::new((id as u64 * 3) % 40);
                let check_out = check_in + chrono::Days::new(id as u64 % 4 + 1);
                Booking {
                    id,
                    room_id: id % 27 + 1,
                    check_in: dates::to_wire(check_in),
                    check_out: dates::to_wire(check_out),
                    guests: (id % 4 + 1) as u32,
                    user_id: id % 12 + 1,
                    ..Booking::default()
                }
            })
            .collect();

        Self {
            users,
            locations,
            rooms,
            bookings,
        }
    }
}
