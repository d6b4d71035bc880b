// Test fixtures for event, state machine and pooling scripts

pub const HEALTH: &str = r#"
using System;
using UnityEngine;
using UnityEngine.Events;

namespace Game.Combat
{
    public class Health : MonoBehaviour
    {
        [SerializeField] private int maxHealth = 100;
        private int current;

        public event Action OnDied;
        public event Action<int> OnDamaged;
        public UnityEvent onHealed;

        public bool IsDead => current <= 0;

        void Awake()
        {
            current = maxHealth;
        }

        public void TakeDamage(int amount)
        {
            if (IsDead) return;
            current -= amount;
            OnDamaged?.Invoke(amount);
            if (current <= 0)
            {
                OnDied?.Invoke();
            }
        }

        public void Heal(int amount)
        {
            current = Math.Min(current + amount, maxHealth);
            onHealed.Invoke();
        }
    }
}
"#;

pub const ENEMY_AI: &str = r#"
using UnityEngine;
using UnityEngine.AI;

namespace Game.Enemies
{
    public enum EnemyState
    {
        Idle,
        Patrol,
        Chase,
        Attack,
        Dead = 10
    }

    [RequireComponent(typeof(NavMeshAgent))]
    public class EnemyAI : MonoBehaviour
    {
        public EnemyState currentState = EnemyState.Idle;
        [SerializeField] private Transform[] waypoints;
        [SerializeField] private float sightRange = 12f;
        private NavMeshAgent agent;
        private Health health;
        private int waypointIndex;

        void Start()
        {
            agent = GetComponent<NavMeshAgent>();
            health = GetComponent<Health>();
            health.OnDied += HandleDeath;
        }

        void Update()
        {
            switch (currentState)
            {
                case EnemyState.Idle:
                    LookAround();
                    break;
                case EnemyState.Patrol:
                    Patrol();
                    break;
                case EnemyState.Chase:
                    ChasePlayer();
                    break;
                case EnemyState.Attack:
                    Attack();
                    break;
            }
        }

        private void Patrol()
        {
            if (waypoints.Length == 0) return;
            agent.SetDestination(waypoints[waypointIndex].position);
            if (!agent.pathPending && agent.remainingDistance < 0.5f)
            {
                waypointIndex = (waypointIndex + 1) % waypoints.Length;
            }
        }

        private void LookAround() { }
        private void ChasePlayer() { }
        private void Attack() { }

        private void HandleDeath()
        {
            currentState = EnemyState.Dead;
        }
    }
}
"#;

pub const SCORE_DISPLAY: &str = r#"
using Game.Core;
using UnityEngine;
using UnityEngine.UI;

namespace Game.UI
{
    public class ScoreDisplay : MonoBehaviour
    {
        [SerializeField] private Text label;
        [SerializeField] private Button restartButton;

        void OnEnable()
        {
            GameManager.Instance.OnScoreChanged += Refresh;
            restartButton.onClick.AddListener(Restart);
        }

        void OnDisable()
        {
            GameManager.Instance.OnScoreChanged -= Refresh;
            restartButton.onClick.RemoveListener(Restart);
        }

        private void Refresh(int score)
        {
            label.text = "Score: " + score;
        }

        private void Restart() { }
    }
}
"#;

pub const BULLET_POOL: &str = r#"
using System.Collections.Generic;
using UnityEngine;

namespace Game.Combat
{
    public class BulletPool : MonoBehaviour
    {
        [SerializeField] private GameObject bulletPrefab;
        [SerializeField] private int initialSize = 20;
        private readonly Queue<GameObject> available = new Queue<GameObject>();

        void Start()
        {
            for (int i = 0; i < initialSize; i++)
            {
                var bullet = Instantiate(bulletPrefab);
                bullet.SetActive(false);
                available.Enqueue(bullet);
            }
        }

        public GameObject Spawn(Vector3 position)
        {
            var bullet = available.Count > 0 ? available.Dequeue() : Instantiate(bulletPrefab);
            bullet.transform.position = position;
            bullet.SetActive(true);
            return bullet;
        }

        public void Despawn(GameObject bullet)
        {
            bullet.SetActive(false);
            available.Enqueue(bullet);
        }
    }
}
"#;
