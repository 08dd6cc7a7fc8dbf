//! Ticket application service

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::dto::*;
use crate::domain::aggregates::{NewTicket, Ticket, User};
use crate::domain::events::DomainEvent;
use crate::domain::services::{authorize, interested_parties, references_resolve, Action, Caller, TicketQuery};
use crate::domain::value_objects::{Period, TicketId, UserId};
use crate::error::{DeskError, DeskResult};
use crate::ports::inbound::TicketUseCases;
use crate::ports::outbound::{Clock, NotificationSink, ReportGenerator, TicketRepository, UserRepository};

/// Ticket application service
///
/// Mutations on one ticket are serialized through a per-ticket async lock
/// held across the read-validate-write sequence.
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationSink>,
    reports: Arc<dyn ReportGenerator>,
    clock: Arc<dyn Clock>,
    locks: DashMap<TicketId, Arc<Mutex<()>>>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationSink>,
        reports: Arc<dyn ReportGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            users,
            notifications,
            reports,
            clock,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: &TicketId) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(*id).or_default())
    }

    async fn directory(&self) -> DeskResult<HashMap<UserId, User>> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(|u| (*u.id(), u)).collect())
    }

    /// Load, transition, persist and notify one ticket under its lock.
    ///
    /// The ticket must be visible (creator and assignee resolvable). Nothing
    /// is written if `transition` fails.
    async fn mutate<F>(&self, caller: Caller, ticket_id: TicketId, transition: F) -> DeskResult<TicketView>
    where
        F: FnOnce(&mut Ticket, &HashMap<UserId, User>, DateTime<Utc>) -> DeskResult<()> + Send,
    {
        let lock = self.lock_for(&ticket_id);
        let _guard = lock.lock().await;

        let users = self.directory().await?;
        let mut ticket = self
            .tickets
            .find_by_id(&ticket_id)
            .await?
            .filter(|t| references_resolve(t, &users))
            .ok_or_else(|| DeskError::NotFound(format!("ticket {ticket_id}")))?;

        if let Err(e) = transition(&mut ticket, &users, self.clock.now()) {
            tracing::warn!(%ticket_id, actor = %caller.user_id, error = %e, "ticket transition rejected");
            return Err(e);
        }
        let events = ticket.take_events();
        self.tickets.update(&ticket).await?;

        // Enqueue before releasing the lock so notifications leave in commit order.
        self.publish(&ticket, events, &users, &caller)
    }

    fn publish(
        &self,
        ticket: &Ticket,
        events: Vec<DomainEvent>,
        users: &HashMap<UserId, User>,
        caller: &Caller,
    ) -> DeskResult<TicketView> {
        let view = TicketView::build(ticket, users)
            .ok_or_else(|| DeskError::NotFound(format!("ticket {}", ticket.id())))?;

        for event in &events {
            tracing::info!(
                event = event.event_type(),
                ticket_id = %event.aggregate_id(),
                actor = %caller.user_id,
                status = ?ticket.status(),
                "ticket event"
            );
        }

        if let Some(last) = events.last() {
            self.notifications.enqueue(TicketNotification {
                envelope: NotificationEnvelope {
                    event: last.event_type().to_string(),
                    ticket: view.clone(),
                },
                recipients: interested_parties(ticket, users.values()),
            });
        }

        Ok(view)
    }

    async fn visible_tickets(&self, caller: Caller, period: Option<Period>) -> DeskResult<Vec<TicketView>> {
        let users = self.directory().await?;
        let query = TicketQuery {
            caller: Some(caller),
            completed_since: period.map(|p| p.window_start(self.clock.now())),
        };

        let mut views: Vec<TicketView> = self
            .tickets
            .list(&query)
            .await?
            .iter()
            .filter_map(|t| TicketView::build(t, &users))
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(views)
    }
}

fn optional_id(raw: Option<&str>) -> DeskResult<Option<UserId>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => UserId::parse(raw).map(Some),
        None => Ok(None),
    }
}

fn resolve<'a>(users: &'a HashMap<UserId, User>, id: &UserId) -> DeskResult<&'a User> {
    users
        .get(id)
        .ok_or_else(|| DeskError::NotFound(format!("user {id}")))
}

#[async_trait]
impl TicketUseCases for TicketService {
    async fn create_ticket(&self, caller: Caller, command: CreateTicketCommand) -> DeskResult<TicketView> {
        authorize(caller.role, Action::CreateTicket)?;
        let assignee_id = optional_id(command.assignee_id.as_deref())?;

        let users = self.directory().await?;
        let creator = resolve(&users, &caller.user_id)?;
        let assignee = assignee_id.map(|id| resolve(&users, &id)).transpose()?;

        let mut ticket = Ticket::create(
            NewTicket {
                title: command.title,
                description: command.description,
                priority: command.priority.unwrap_or_default(),
                deadline_at: command.deadline_at,
                photos: command.photos,
            },
            creator,
            assignee,
            self.clock.now(),
        )?;

        let events = ticket.take_events();
        self.tickets.insert(&ticket).await?;
        self.publish(&ticket, events, &users, &caller)
    }

    async fn accept_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: AcceptTicketCommand,
    ) -> DeskResult<TicketView> {
        authorize(caller.role, Action::AcceptTicket)?;
        let ticket_id = TicketId::parse(ticket_id)?;

        self.mutate(caller, ticket_id, |ticket, users, now| {
            let technician = resolve(users, &caller.user_id)?;
            ticket.accept(technician, command.estimated_completion, now)?;
            Ok(())
        })
        .await
    }

    async fn assign_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: AssignTicketCommand,
    ) -> DeskResult<TicketView> {
        authorize(caller.role, Action::AssignTicket)?;
        let ticket_id = TicketId::parse(ticket_id)?;
        let technician_id = UserId::parse(&command.technician_id)?;

        self.mutate(caller, ticket_id, |ticket, users, now| {
            resolve(users, &caller.user_id)?;
            let technician = resolve(users, &technician_id)?;
            ticket.assign(technician, &caller.user_id, now)?;
            Ok(())
        })
        .await
    }

    async fn complete_ticket(
        &self,
        caller: Caller,
        ticket_id: &str,
        command: CompleteTicketCommand,
    ) -> DeskResult<TicketView> {
        authorize(caller.role, Action::CompleteTicket)?;
        let ticket_id = TicketId::parse(ticket_id)?;
        let comments = command
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        self.mutate(caller, ticket_id, |ticket, _, now| {
            ticket.complete(comments, now);
            Ok(())
        })
        .await
    }

    async fn list_tickets(&self, caller: Caller, period: Option<Period>) -> DeskResult<Vec<TicketView>> {
        authorize(caller.role, Action::ListTickets)?;
        self.visible_tickets(caller, period).await
    }

    async fn get_ticket(&self, caller: Caller, ticket_id: &str) -> DeskResult<TicketView> {
        authorize(caller.role, Action::ListTickets)?;
        let id = TicketId::parse(ticket_id)?;

        let users = self.directory().await?;
        self.tickets
            .find_by_id(&id)
            .await?
            .filter(|t| caller.can_see(t))
            .and_then(|t| TicketView::build(&t, &users))
            .ok_or_else(|| DeskError::NotFound(format!("ticket {id}")))
    }

    async fn export_report(&self, caller: Caller, period: Period) -> DeskResult<ReportDocument> {
        authorize(caller.role, Action::ExportReport)?;
        let views = self.visible_tickets(caller, Some(period)).await?;
        let now = self.clock.now();

        let body = self.reports.render(&views, period, now)?;
        tracing::info!(period = %period, tickets = views.len(), bytes = body.len(), "report exported");

        Ok(ReportDocument {
            content_type: self.reports.content_type(),
            file_name: format!("tickets-{}-{}.txt", period, now.format("%Y%m%d")),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixture::Desk;
    use crate::domain::aggregates::TicketStatus;
    use crate::domain::value_objects::{Priority, Role};
    use chrono::{Duration, TimeZone};

    fn leak() -> CreateTicketCommand {
        CreateTicketCommand {
            title: "Leak in roof".into(),
            description: "Water over bay 3".into(),
            priority: Some(Priority::High),
            assignee_id: None,
            deadline_at: None,
            photos: vec![],
        }
    }

    #[tokio::test]
    async fn test_first_come_acceptance() {
        let desk = Desk::new().await;
        let manager = desk.user("manager1", Role::Manager).await;
        let tech_a = desk.user("tech_a", Role::Technician).await;
        let tech_b = desk.user("tech_b", Role::Technician).await;

        let ticket = desk.tickets.create_ticket(manager, leak()).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::New);
        assert!(ticket.assignee.is_none());

        let id = ticket.id.to_string();
        let ticket = desk
            .tickets
            .accept_ticket(tech_a, &id, AcceptTicketCommand::default())
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.assignee.as_ref().map(|a| a.id), Some(tech_a.user_id));
        assert!(ticket.assigned_by.is_none());

        let err = desk
            .tickets
            .accept_ticket(tech_b, &id, AcceptTicketCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidState(_)));

        let ticket = desk
            .tickets
            .complete_ticket(tech_a, &id, CompleteTicketCommand { comments: Some("Fixed".into()) })
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert!(ticket.completed_at.is_some());
        assert_eq!(ticket.comments.as_deref(), Some("Fixed"));
    }

    #[tokio::test]
    async fn test_designated_technician_only() {
        let desk = Desk::new().await;
        let manager = desk.user("manager1", Role::Manager).await;
        let tech_c = desk.user("tech_c", Role::Technician).await;
        let tech_d = desk.user("tech_d", Role::Technician).await;

        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        let ticket = desk
            .tickets
            .assign_ticket(manager, &id, AssignTicketCommand { technician_id: tech_c.user_id.to_string() })
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Assigned);
        assert_eq!(ticket.assigned_by.as_ref().map(|u| u.id), Some(manager.user_id));

        let err = desk
            .tickets
            .accept_ticket(tech_d, &id, AcceptTicketCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidState(_)));

        let ticket = desk
            .tickets
            .accept_ticket(tech_c, &id, AcceptTicketCommand::default())
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.assignee.map(|a| a.id), Some(tech_c.user_id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accept_has_one_winner() {
        let desk = Desk::new().await;
        let manager = desk.user("manager1", Role::Manager).await;
        let mut techs = Vec::new();
        for i in 0..8 {
            techs.push(desk.user(&format!("tech{i}"), Role::Technician).await);
        }
        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();

        let handles: Vec<_> = techs
            .iter()
            .map(|tech| {
                let service = Arc::clone(&desk.tickets);
                let tech = *tech;
                let id = id.clone();
                tokio::spawn(async move {
                    service.accept_ticket(tech, &id, AcceptTicketCommand::default()).await
                })
            })
            .collect();

        let mut winners = Vec::new();
        for (tech, handle) in techs.iter().zip(handles) {
            match handle.await.unwrap() {
                Ok(_) => winners.push(tech.user_id),
                Err(err) => assert!(matches!(err, DeskError::InvalidState(_)), "{err}"),
            }
        }
        assert_eq!(winners.len(), 1);

        let stored = desk.tickets.get_ticket(manager, &id).await.unwrap();
        assert_eq!(stored.assignee.map(|a| a.id), Some(winners[0]));
    }

    #[tokio::test]
    async fn test_forbidden_before_not_found() {
        let desk = Desk::new().await;
        let tech = desk.user("tech", Role::Technician).await;
        let manager = desk.user("manager", Role::Manager).await;
        let missing = TicketId::new().to_string();

        let err = desk
            .tickets
            .assign_ticket(tech, &missing, AssignTicketCommand { technician_id: tech.user_id.to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Forbidden { action: Action::AssignTicket }));

        let err = desk
            .tickets
            .assign_ticket(manager, &missing, AssignTicketCommand { technician_id: tech.user_id.to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));

        let err = desk
            .tickets
            .accept_ticket(tech, "not-an-id", AcceptTicketCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
    }

    #[tokio::test]
    async fn test_assigning_non_technician_changes_nothing() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let director = desk.user("director", Role::Director).await;
        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        desk.sink.clear();

        let err = desk
            .tickets
            .assign_ticket(manager, &id, AssignTicketCommand { technician_id: director.user_id.to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));

        let stored = desk.tickets.get_ticket(manager, &id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::New);
        assert!(stored.assignee.is_none());
        assert!(desk.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_complete_has_no_status_guard() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let tech = desk.user("tech", Role::Technician).await;
        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();

        let ticket = desk
            .tickets
            .complete_ticket(tech, &id, CompleteTicketCommand::default())
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert!(ticket.assignee.is_none());
        assert!(ticket.comments.is_none());
    }

    #[tokio::test]
    async fn test_technician_listing_scope() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let tech_a = desk.user("tech_a", Role::Technician).await;
        let tech_b = desk.user("tech_b", Role::Technician).await;

        let open = desk.tickets.create_ticket(manager, leak()).await.unwrap();
        let taken = desk.tickets.create_ticket(manager, leak()).await.unwrap();
        let assigned = desk.tickets.create_ticket(manager, leak()).await.unwrap();
        desk.tickets
            .accept_ticket(tech_a, &taken.id.to_string(), AcceptTicketCommand::default())
            .await
            .unwrap();
        desk.tickets
            .assign_ticket(manager, &assigned.id.to_string(), AssignTicketCommand { technician_id: tech_a.user_id.to_string() })
            .await
            .unwrap();

        let ids = |views: Vec<TicketView>| views.into_iter().map(|v| v.id).collect::<Vec<_>>();

        let seen_by_b = ids(desk.tickets.list_tickets(tech_b, None).await.unwrap());
        assert!(seen_by_b.contains(&open.id));
        assert!(seen_by_b.contains(&assigned.id));
        assert!(!seen_by_b.contains(&taken.id));

        let seen_by_a = ids(desk.tickets.list_tickets(tech_a, None).await.unwrap());
        assert_eq!(seen_by_a.len(), 3);

        let err = desk.tickets.get_ticket(tech_b, &taken.id.to_string()).await.unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let first = desk.tickets.create_ticket(manager, leak()).await.unwrap();
        desk.clock.advance(Duration::minutes(1));
        let second = desk.tickets.create_ticket(manager, leak()).await.unwrap();

        let listed = desk.tickets.list_tickets(manager, None).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_day_period_filters_on_completion() {
        let desk = Desk::new().await;
        desk.clock.set(Utc.with_ymd_and_hms(2026, 5, 10, 22, 0, 0).unwrap());
        let manager = desk.user("manager", Role::Manager).await;
        let tech = desk.user("tech", Role::Technician).await;

        let yesterday = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        desk.tickets
            .complete_ticket(tech, &yesterday, CompleteTicketCommand::default())
            .await
            .unwrap();

        desk.clock.set(Utc.with_ymd_and_hms(2026, 5, 11, 9, 0, 0).unwrap());
        let today = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        desk.tickets
            .complete_ticket(tech, &today, CompleteTicketCommand::default())
            .await
            .unwrap();
        let open = desk.tickets.create_ticket(manager, leak()).await.unwrap().id;

        let listed = desk.tickets.list_tickets(manager, Some(Period::Day)).await.unwrap();
        let ids: Vec<String> = listed.iter().map(|v| v.id.to_string()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&today));
        assert!(ids.contains(&open.to_string()));
        assert!(!ids.contains(&yesterday));

        let month = desk.tickets.list_tickets(manager, Some(Period::Month)).await.unwrap();
        assert_eq!(month.len(), 3);
    }

    #[tokio::test]
    async fn test_deleted_creator_hides_ticket() {
        let desk = Desk::new().await;
        let director = desk.user("director", Role::Director).await;
        let manager = desk.user("manager", Role::Manager).await;
        let tech = desk.user("tech", Role::Technician).await;
        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();

        desk.remove_user(&manager.user_id).await;

        assert!(desk.tickets.list_tickets(director, None).await.unwrap().is_empty());
        let err = desk
            .tickets
            .accept_ticket(tech, &id, AcceptTicketCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_notification_recipients() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let director = desk.user("director", Role::Director).await;
        let admin = desk.user("admin", Role::Admin).await;
        let tech = desk.user("tech", Role::Technician).await;
        let bystander = desk.user("bystander", Role::Technician).await;

        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        desk.tickets
            .accept_ticket(tech, &id, AcceptTicketCommand::default())
            .await
            .unwrap();

        let sent = desk.sink.events();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].envelope.event, "ticket.created");
        assert!(!sent[0].recipients.contains(&tech.user_id));

        let accepted = &sent[1];
        assert_eq!(accepted.envelope.event, "ticket.accepted");
        assert_eq!(accepted.recipients.len(), 4);
        for who in [manager, director, admin, tech] {
            assert!(accepted.recipients.contains(&who.user_id));
        }
        assert!(!accepted.recipients.contains(&bystander.user_id));
    }

    #[tokio::test]
    async fn test_export_report() {
        let desk = Desk::new().await;
        let manager = desk.user("manager", Role::Manager).await;
        let tech = desk.user("Ivan", Role::Technician).await;
        let id = desk.tickets.create_ticket(manager, leak()).await.unwrap().id.to_string();
        desk.tickets
            .accept_ticket(tech, &id, AcceptTicketCommand::default())
            .await
            .unwrap();
        desk.tickets
            .complete_ticket(tech, &id, CompleteTicketCommand { comments: Some("Sealed".into()) })
            .await
            .unwrap();

        let report = desk.tickets.export_report(manager, Period::Day).await.unwrap();
        assert!(report.content_type.starts_with("text/plain"));
        let text = String::from_utf8(report.body).unwrap();
        assert!(text.contains("Leak in roof"));
        assert!(text.contains("Sealed"));

        let err = desk.tickets.export_report(tech, Period::Day).await.unwrap_err();
        assert!(matches!(err, DeskError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_committed_accept_reaches_live_connections() {
        use crate::infrastructure::notifications::testing::RecordingTransport;
        use crate::infrastructure::{
            Broadcaster, ConnectionRegistry, InMemoryTicketRepository, NotificationQueue, TextReportGenerator,
        };
        use crate::domain::value_objects::ConnectionId;

        let desk = Desk::new().await;
        let manager = desk.user("mila", Role::Manager).await;
        let director = desk.user("dana", Role::Director).await;
        let tech = desk.user("ivan", Role::Technician).await;
        let bystander = desk.user("petr", Role::Technician).await;

        let registry = Arc::new(ConnectionRegistry::new());
        let transport = RecordingTransport::new();
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            transport.clone(),
            std::time::Duration::from_secs(1),
        ));
        let (queue, dispatcher) = NotificationQueue::start(broadcaster, 16);
        let service = TicketService::new(
            Arc::new(InMemoryTicketRepository::new()),
            desk.user_repo.clone(),
            Arc::new(queue),
            Arc::new(TextReportGenerator::new()),
            desk.clock.clone(),
        );

        let manager_phone = registry.register(manager.user_id);
        let manager_laptop = registry.register(manager.user_id);
        let director_conn = registry.register(director.user_id);
        let tech_conn = registry.register(tech.user_id);
        let bystander_conn = registry.register(bystander.user_id);

        let ticket = service.create_ticket(manager, leak()).await.unwrap();
        service
            .accept_ticket(tech, &ticket.id.to_string(), AcceptTicketCommand::default())
            .await
            .unwrap();

        // Dropping the service closes the queue; the dispatcher drains it and exits.
        drop(service);
        dispatcher.await.unwrap();

        let events = |conn: &ConnectionId| -> Vec<(String, TicketStatus)> {
            transport
                .sent_to(conn)
                .iter()
                .map(|p| {
                    let envelope: NotificationEnvelope = serde_json::from_str(p).unwrap();
                    (envelope.event, envelope.ticket.status)
                })
                .collect()
        };
        let both = vec![
            ("ticket.created".to_string(), TicketStatus::New),
            ("ticket.accepted".to_string(), TicketStatus::InProgress),
        ];

        assert_eq!(events(&manager_phone), both);
        assert_eq!(events(&manager_laptop), both);
        assert_eq!(events(&director_conn), both);
        assert_eq!(events(&tech_conn), vec![("ticket.accepted".to_string(), TicketStatus::InProgress)]);
        assert!(events(&bystander_conn).is_empty());
        assert!(transport.closed().is_empty());
    }
}
